//! Error types surfaced by the simulation core.

use alsvid_ir::IrError;
use thiserror::Error;

/// Errors surfaced by registers, kernels and the layers built on them.
///
/// Kernel-level errors abort the current circuit; the register is left in an
/// indeterminate state and must be discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Structural problem in the request: bad qubit index, control = target,
    /// unknown classical slot, qubit count outside the supported range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A runtime index escaped the store during kernel dispatch. This is a
    /// bug in the dispatching layer, not in the caller's circuit.
    #[error("index {index} escaped the {size}-amplitude store during kernel dispatch")]
    OutOfRange {
        /// The offending amplitude index.
        index: usize,
        /// The store size.
        size: usize,
    },

    /// The pre-flight memory check failed; nothing was allocated.
    #[error(
        "a {num_qubits}-qubit state needs {required} bytes but only {available} bytes of \
         physical memory are available"
    )]
    ResourceExhausted {
        /// Requested qubit count.
        num_qubits: u32,
        /// Bytes required, including overhead.
        required: u64,
        /// Bytes currently available.
        available: u64,
    },

    /// A measurement outcome has too little probability mass to renormalize.
    #[error(
        "measurement of qubit {qubit} drew outcome {outcome} with probability mass \
         {probability:.3e}, below the renormalization floor"
    )]
    NumericallyDegenerate {
        /// The measured qubit.
        qubit: u32,
        /// The drawn outcome.
        outcome: bool,
        /// Probability mass of that outcome.
        probability: f64,
    },

    /// Pair-exchange send/receive failed. Fatal to the in-flight circuit on
    /// every rank.
    #[error("pair exchange with rank {partner} failed: {reason}")]
    DistributedTransport {
        /// The partner rank of the failed exchange.
        partner: usize,
        /// Transport-level failure description.
        reason: String,
    },

    /// A parameter vector does not match the tape's parameterized-gate count.
    #[error("parameter vector has {got} entries but the tape has {expected} trainable parameters")]
    ShapeMismatch {
        /// Number of parameterized entries on the tape.
        expected: usize,
        /// Length of the supplied vector.
        got: usize,
    },
}

impl From<IrError> for SimError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::ParameterCountMismatch { expected, got } => {
                SimError::ShapeMismatch { expected, got }
            }
            other => SimError::InvalidArgument(other.to_string()),
        }
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
