//! The amplitude store.
//!
//! Owns the 2^L complex amplitudes of a (local) statevector as one
//! contiguous buffer, real/imag interleaved in the natural `Complex64`
//! layout. Gate kernels address it through the pair-walk in
//! [`crate::kernel`].

use num_complex::Complex64;
use rayon::prelude::*;

use crate::kernel::PARALLEL_THRESHOLD;

/// A contiguous buffer of 2^L amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeStore {
    amps: Vec<Complex64>,
    qubits: usize,
}

impl AmplitudeStore {
    /// Allocate a store of 2^qubits amplitudes in the ground state: the
    /// amplitude at index 0 is 1, all others are 0.
    pub fn ground(qubits: usize) -> Self {
        let mut amps = vec![Complex64::new(0.0, 0.0); 1 << qubits];
        amps[0] = Complex64::new(1.0, 0.0);
        Self { amps, qubits }
    }

    /// Allocate an all-zero store of 2^qubits amplitudes.
    ///
    /// Distributed ranks other than rank 0 start from this: their slice of
    /// the global ground state carries no amplitude.
    pub fn zeroed(qubits: usize) -> Self {
        Self {
            amps: vec![Complex64::new(0.0, 0.0); 1 << qubits],
            qubits,
        }
    }

    /// Number of locally stored qubits (L).
    pub fn num_qubits(&self) -> usize {
        self.qubits
    }

    /// Number of amplitudes (2^L).
    pub fn size(&self) -> usize {
        self.amps.len()
    }

    /// Read the amplitude at `index`.
    #[inline]
    pub fn amp(&self, index: usize) -> Complex64 {
        self.amps[index]
    }

    /// Write the amplitude at `index`.
    #[inline]
    pub fn set_amp(&mut self, index: usize, value: Complex64) {
        self.amps[index] = value;
    }

    /// The full buffer.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.amps
    }

    /// The full buffer, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.amps
    }

    /// Return to the ground state without reallocating.
    pub fn reset(&mut self) {
        self.amps.fill(Complex64::new(0.0, 0.0));
        self.amps[0] = Complex64::new(1.0, 0.0);
    }

    /// Zero every amplitude without reallocating.
    pub fn zero(&mut self) {
        self.amps.fill(Complex64::new(0.0, 0.0));
    }

    /// Σ |amplitude|² over the local buffer.
    pub fn norm_sqr(&self) -> f64 {
        if self.amps.len() >= PARALLEL_THRESHOLD {
            self.amps.par_iter().map(Complex64::norm_sqr).sum()
        } else {
            self.amps.iter().map(Complex64::norm_sqr).sum()
        }
    }

    /// Multiply every amplitude by a real factor.
    pub fn scale(&mut self, factor: f64) {
        if self.amps.len() >= PARALLEL_THRESHOLD {
            self.amps.par_iter_mut().for_each(|a| *a *= factor);
        } else {
            for a in &mut self.amps {
                *a *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_state_has_unit_norm() {
        let store = AmplitudeStore::ground(4);
        assert_eq!(store.size(), 16);
        assert_eq!(store.amp(0), Complex64::new(1.0, 0.0));
        assert!((store.norm_sqr() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn reset_restores_ground() {
        let mut store = AmplitudeStore::ground(2);
        store.set_amp(0, Complex64::new(0.0, 0.0));
        store.set_amp(3, Complex64::new(1.0, 0.0));
        store.reset();
        assert_eq!(store.amp(0), Complex64::new(1.0, 0.0));
        assert_eq!(store.amp(3), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn scale_rescales_norm() {
        let mut store = AmplitudeStore::ground(3);
        store.scale(0.5);
        assert!((store.norm_sqr() - 0.25).abs() < 1e-15);
    }
}
