//! Quantum gate descriptors.
//!
//! [`Gate`] is one flat sum type per executable operation, carrying resolved
//! operands and angles. All gate semantics needed elsewhere — operand lists,
//! inverses, generators, matrices — are pure functions on the variant.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::matrix::Matrix2;

/// A single executable operation on a register.
///
/// Qubit index `t` addresses bit `t` of the 0-based amplitude index, so the
/// stride between paired amplitudes is `2^t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Hadamard gate.
    H { target: u32 },
    /// Pauli-X gate.
    X { target: u32 },
    /// Pauli-Y gate.
    Y { target: u32 },
    /// Pauli-Z gate.
    Z { target: u32 },
    /// S gate (√Z).
    S { target: u32 },
    /// S-dagger gate.
    Sdg { target: u32 },
    /// T gate (fourth root of Z).
    T { target: u32 },
    /// T-dagger gate.
    Tdg { target: u32 },
    /// Rotation around the X axis.
    Rx { target: u32, theta: f64 },
    /// Rotation around the Y axis.
    Ry { target: u32, theta: f64 },
    /// Rotation around the Z axis.
    Rz { target: u32, theta: f64 },
    /// Phase gate diag(1, e^{iφ}).
    Phase { target: u32, phi: f64 },
    /// An arbitrary fused 2×2 unitary produced by the optimization pre-pass.
    Fused { target: u32, matrix: Matrix2 },
    /// Controlled-NOT gate.
    Cnot { control: u32, target: u32 },
    /// Controlled-Z gate.
    Cz { control: u32, target: u32 },
    /// SWAP gate.
    Swap { a: u32, b: u32 },
    /// Toffoli (CCX) gate.
    Toffoli { controls: [u32; 2], target: u32 },
    /// Projective measurement into a classical register slot.
    Measure { target: u32, cbit: u32 },
}

impl Gate {
    /// Short lowercase name of the gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H { .. } => "h",
            Gate::X { .. } => "x",
            Gate::Y { .. } => "y",
            Gate::Z { .. } => "z",
            Gate::S { .. } => "s",
            Gate::Sdg { .. } => "sdg",
            Gate::T { .. } => "t",
            Gate::Tdg { .. } => "tdg",
            Gate::Rx { .. } => "rx",
            Gate::Ry { .. } => "ry",
            Gate::Rz { .. } => "rz",
            Gate::Phase { .. } => "phase",
            Gate::Fused { .. } => "fused",
            Gate::Cnot { .. } => "cnot",
            Gate::Cz { .. } => "cz",
            Gate::Swap { .. } => "swap",
            Gate::Toffoli { .. } => "toffoli",
            Gate::Measure { .. } => "measure",
        }
    }

    /// All qubit operands, controls first.
    pub fn qubits(&self) -> Vec<u32> {
        match *self {
            Gate::H { target }
            | Gate::X { target }
            | Gate::Y { target }
            | Gate::Z { target }
            | Gate::S { target }
            | Gate::Sdg { target }
            | Gate::T { target }
            | Gate::Tdg { target }
            | Gate::Rx { target, .. }
            | Gate::Ry { target, .. }
            | Gate::Rz { target, .. }
            | Gate::Phase { target, .. }
            | Gate::Fused { target, .. }
            | Gate::Measure { target, .. } => vec![target],
            Gate::Cnot { control, target } | Gate::Cz { control, target } => {
                vec![control, target]
            }
            Gate::Swap { a, b } => vec![a, b],
            Gate::Toffoli { controls, target } => vec![controls[0], controls[1], target],
        }
    }

    /// True if the gate acts on exactly one qubit (measurement excluded).
    pub fn is_single_qubit(&self) -> bool {
        !matches!(self, Gate::Measure { .. }) && self.qubits().len() == 1
    }

    /// True if the gate matrix is diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Gate::Z { .. }
                | Gate::S { .. }
                | Gate::Sdg { .. }
                | Gate::T { .. }
                | Gate::Tdg { .. }
                | Gate::Rz { .. }
                | Gate::Phase { .. }
                | Gate::Cz { .. }
        ) || matches!(self, Gate::Fused { matrix, .. } if matrix.is_diagonal())
    }

    /// True if this gate carries a trainable rotation angle.
    ///
    /// Only rotations generated by a Pauli with eigenvalues ±1 participate
    /// in gradients; the phase gate does not.
    #[inline]
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Gate::Rx { .. } | Gate::Ry { .. } | Gate::Rz { .. })
    }

    /// The rotation angle, for parameterized gates.
    pub fn angle(&self) -> Option<f64> {
        match *self {
            Gate::Rx { theta, .. } | Gate::Ry { theta, .. } | Gate::Rz { theta, .. } => {
                Some(theta)
            }
            _ => None,
        }
    }

    /// Replace the rotation angle of a parameterized gate.
    ///
    /// Returns the gate unchanged for non-parameterized variants.
    #[must_use]
    pub fn with_angle(self, theta: f64) -> Self {
        match self {
            Gate::Rx { target, .. } => Gate::Rx { target, theta },
            Gate::Ry { target, .. } => Gate::Ry { target, theta },
            Gate::Rz { target, .. } => Gate::Rz { target, theta },
            other => other,
        }
    }

    /// The Pauli generator of a parameterized rotation, as a gate on the
    /// same target: RX → X, RY → Y, RZ → Z.
    pub fn generator(&self) -> Option<Gate> {
        match *self {
            Gate::Rx { target, .. } => Some(Gate::X { target }),
            Gate::Ry { target, .. } => Some(Gate::Y { target }),
            Gate::Rz { target, .. } => Some(Gate::Z { target }),
            _ => None,
        }
    }

    /// The unitary inverse of this gate.
    ///
    /// H, the Paulis, CNOT, CZ, SWAP and Toffoli are self-inverse; S†/T†
    /// invert S/T; rotations negate the angle. Measurement has no inverse.
    pub fn inverse(&self) -> IrResult<Gate> {
        match *self {
            Gate::H { .. }
            | Gate::X { .. }
            | Gate::Y { .. }
            | Gate::Z { .. }
            | Gate::Cnot { .. }
            | Gate::Cz { .. }
            | Gate::Swap { .. }
            | Gate::Toffoli { .. } => Ok(*self),
            Gate::S { target } => Ok(Gate::Sdg { target }),
            Gate::Sdg { target } => Ok(Gate::S { target }),
            Gate::T { target } => Ok(Gate::Tdg { target }),
            Gate::Tdg { target } => Ok(Gate::T { target }),
            Gate::Rx { target, theta } => Ok(Gate::Rx { target, theta: -theta }),
            Gate::Ry { target, theta } => Ok(Gate::Ry { target, theta: -theta }),
            Gate::Rz { target, theta } => Ok(Gate::Rz { target, theta: -theta }),
            Gate::Phase { target, phi } => Ok(Gate::Phase { target, phi: -phi }),
            Gate::Fused { target, matrix } => Ok(Gate::Fused {
                target,
                matrix: matrix.dagger(),
            }),
            Gate::Measure { .. } => Err(IrError::NotInvertible { gate: self.name() }),
        }
    }

    /// The 2×2 unitary of a single-qubit gate; `None` for multi-qubit gates
    /// and measurement.
    pub fn single_qubit_matrix(&self) -> Option<Matrix2> {
        match *self {
            Gate::H { .. } => Some(Matrix2::h()),
            Gate::X { .. } => Some(Matrix2::x()),
            Gate::Y { .. } => Some(Matrix2::y()),
            Gate::Z { .. } => Some(Matrix2::z()),
            Gate::S { .. } => Some(Matrix2::s()),
            Gate::Sdg { .. } => Some(Matrix2::sdg()),
            Gate::T { .. } => Some(Matrix2::t()),
            Gate::Tdg { .. } => Some(Matrix2::tdg()),
            Gate::Rx { theta, .. } => Some(Matrix2::rx(theta)),
            Gate::Ry { theta, .. } => Some(Matrix2::ry(theta)),
            Gate::Rz { theta, .. } => Some(Matrix2::rz(theta)),
            Gate::Phase { phi, .. } => Some(Matrix2::phase(phi)),
            Gate::Fused { matrix, .. } => Some(matrix),
            _ => None,
        }
    }

    /// Validate operands against a register of `num_qubits` qubits.
    ///
    /// Control = target and any qubit index ≥ `num_qubits` are rejected.
    pub fn validate(&self, num_qubits: u32) -> IrResult<()> {
        let qubits = self.qubits();
        for &q in &qubits {
            if q >= num_qubits {
                return Err(IrError::QubitOutOfRange {
                    gate: self.name(),
                    qubit: q,
                    num_qubits,
                });
            }
        }
        for (i, &q) in qubits.iter().enumerate() {
            if qubits[i + 1..].contains(&q) {
                return Err(IrError::ControlTargetOverlap {
                    gate: self.name(),
                    qubit: q,
                });
            }
        }
        Ok(())
    }
}
