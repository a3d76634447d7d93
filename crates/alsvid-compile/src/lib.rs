//! Alsvid pre-execution optimization.
//!
//! An optional pipeline that runs over a [`Circuit`] before it reaches a
//! register. Three cumulative levels:
//!
//! - **O1** — cancel adjacent gate pairs whose product is the identity
//!   within 1e-10 (up to global phase).
//! - **O2** — O1, then fuse consecutive single-qubit gates on the same
//!   qubit into one 2×2 unitary, flushing whenever a multi-qubit gate or
//!   measurement touches that qubit.
//! - **O3** — O2, with a commuting-reorder pass first so fusion windows
//!   stretch across gates that commute with the run.
//!
//! The pipeline is semantics-preserving up to global phase.
//!
//! ```rust
//! use alsvid_compile::{OptLevel, PrePass};
//! use alsvid_ir::Circuit;
//!
//! let mut circuit = Circuit::new(1);
//! circuit.x(0).unwrap().x(0).unwrap().h(0).unwrap();
//!
//! let optimized = PrePass::with_level(OptLevel::O1).run(&circuit).unwrap();
//! assert_eq!(optimized.len(), 1); // the X pair is gone
//! ```

pub mod passes;

use alsvid_ir::{Circuit, IrResult};
use tracing::debug;

pub use passes::{CancelAdjacentInverses, FuseSingleQubitRuns, Pass, ReorderCommuting};

/// Optimization level of the pre-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// Identity-pair cancellation only.
    #[default]
    O1,
    /// Cancellation plus single-qubit run fusion.
    O2,
    /// Commuting reorder, then cancellation and fusion.
    O3,
}

/// The composed pre-execution pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PrePass {
    level: OptLevel,
}

impl PrePass {
    /// Build a pipeline at the given level.
    pub fn with_level(level: OptLevel) -> Self {
        Self { level }
    }

    /// Optimize a circuit, returning a new one over the same qubits.
    pub fn run(&self, circuit: &Circuit) -> IrResult<Circuit> {
        let mut ops = circuit.ops().to_vec();
        let before = ops.len();

        match self.level {
            OptLevel::O1 => {
                CancelAdjacentInverses.run(&mut ops);
            }
            OptLevel::O2 => {
                CancelAdjacentInverses.run(&mut ops);
                FuseSingleQubitRuns.run(&mut ops);
            }
            OptLevel::O3 => {
                ReorderCommuting.run(&mut ops);
                CancelAdjacentInverses.run(&mut ops);
                FuseSingleQubitRuns.run(&mut ops);
            }
        }

        debug!(level = ?self.level, before, after = ops.len(), "pre-pass complete");
        Circuit::from_ops(circuit.num_qubits(), ops)
    }
}
