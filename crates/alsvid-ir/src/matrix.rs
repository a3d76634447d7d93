//! 2×2 unitary matrix utilities.
//!
//! Every single-qubit gate lowers to a [`Matrix2`]; the engine's dense kernel
//! and the fusion pass both consume this form.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Tolerance for identity detection.
const EPSILON: f64 = 1e-10;

/// A 2×2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Matrix2 {
    /// Create a new 2×2 matrix from row-major elements.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0))
    }

    /// A diagonal matrix diag(d0, d1).
    pub fn diagonal(d0: Complex64, d1: Complex64) -> Self {
        Self::new(
            d0,
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            d1,
        )
    }

    /// The Hadamard matrix.
    pub fn h() -> Self {
        let s = FRAC_1_SQRT_2;
        Self::new(
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(-s, 0.0),
        )
    }

    /// The Pauli-X matrix.
    pub fn x() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// The Pauli-Y matrix.
    pub fn y() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// The Pauli-Z matrix.
    pub fn z() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(-1.0, 0.0))
    }

    /// The S gate (√Z).
    pub fn s() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0))
    }

    /// The S-dagger gate.
    pub fn sdg() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::new(0.0, -1.0))
    }

    /// The T gate (fourth root of Z).
    pub fn t() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, PI / 4.0))
    }

    /// The T-dagger gate.
    pub fn tdg() -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, -PI / 4.0))
    }

    /// The RX rotation matrix.
    pub fn rx(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(0.0, -s),
            Complex64::new(0.0, -s),
            Complex64::new(c, 0.0),
        )
    }

    /// The RY rotation matrix.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// The RZ rotation matrix.
    pub fn rz(theta: f64) -> Self {
        Self::diagonal(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// The phase gate P(φ) = diag(1, e^{iφ}).
    pub fn phase(phi: f64) -> Self {
        Self::diagonal(Complex64::new(1.0, 0.0), Complex64::from_polar(1.0, phi))
    }

    /// Matrix product `self * other`.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// True if both off-diagonal elements vanish.
    pub fn is_diagonal(&self) -> bool {
        self.data[1].norm() < EPSILON && self.data[2].norm() < EPSILON
    }

    /// True if this is the identity up to a global phase.
    ///
    /// For a unitary this holds exactly when the off-diagonal vanishes and
    /// both diagonal elements are equal.
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }
        (a - d).norm() < EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Matrix2, b: &Matrix2) -> bool {
        a.data
            .iter()
            .zip(b.data.iter())
            .all(|(x, y)| (x - y).norm() < 1e-12)
    }

    #[test]
    fn hadamard_is_self_inverse() {
        let hh = Matrix2::h().mul(&Matrix2::h());
        assert!(hh.is_identity());
    }

    #[test]
    fn s_squared_is_z() {
        let ss = Matrix2::s().mul(&Matrix2::s());
        assert!(approx(&ss, &Matrix2::z()));
    }

    #[test]
    fn t_squared_is_s() {
        let tt = Matrix2::t().mul(&Matrix2::t());
        assert!(approx(&tt, &Matrix2::s()));
    }

    #[test]
    fn rotation_times_dagger_is_identity() {
        for theta in [0.3, -1.2, 4.5] {
            assert!(Matrix2::rx(theta).mul(&Matrix2::rx(theta).dagger()).is_identity());
            assert!(Matrix2::ry(theta).mul(&Matrix2::ry(theta).dagger()).is_identity());
            assert!(Matrix2::rz(theta).mul(&Matrix2::rz(theta).dagger()).is_identity());
        }
    }

    #[test]
    fn full_turn_is_identity_up_to_phase() {
        // RX(2π) = −I: identity up to global phase.
        assert!(Matrix2::rx(2.0 * PI).is_identity());
    }

    #[test]
    fn diagonal_detection() {
        assert!(Matrix2::rz(0.7).is_diagonal());
        assert!(!Matrix2::h().is_diagonal());
    }
}
