//! Error types for the IR crate.

use thiserror::Error;

/// Errors raised while building or transforming circuits and tapes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A gate references a qubit index outside the register.
    #[error("gate '{gate}' references qubit {qubit} but the circuit has {num_qubits} qubits")]
    QubitOutOfRange {
        /// Name of the offending gate.
        gate: &'static str,
        /// The out-of-range qubit index.
        qubit: u32,
        /// Number of qubits in the circuit.
        num_qubits: u32,
    },

    /// A controlled gate uses the same qubit as control and target.
    #[error("gate '{gate}' uses qubit {qubit} as both control and target")]
    ControlTargetOverlap {
        /// Name of the offending gate.
        gate: &'static str,
        /// The duplicated qubit index.
        qubit: u32,
    },

    /// A parameter vector does not match the tape's parameterized-gate count.
    #[error("tape has {expected} trainable parameters but {got} values were supplied")]
    ParameterCountMismatch {
        /// Number of parameterized entries on the tape.
        expected: usize,
        /// Length of the supplied parameter vector.
        got: usize,
    },

    /// A parameter index is outside the tape's parameterized-gate range.
    #[error("parameter index {index} is out of range for a tape with {num_parameters} parameters")]
    ParameterIndexOutOfRange {
        /// The requested parameter index.
        index: usize,
        /// Number of parameterized entries on the tape.
        num_parameters: usize,
    },

    /// The gate has no unitary inverse (measurement on a tape).
    #[error("gate '{gate}' is not invertible")]
    NotInvertible {
        /// Name of the offending gate.
        gate: &'static str,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
