//! Alsvid differentiation layer and optimizer drivers.
//!
//! Computes analytic gradients of Pauli-sum expectation values with respect
//! to the trainable rotation angles of a recorded [`Tape`], and drives
//! gradient-descent / Adam / SPSA loops over them. Everything is generic
//! over [`Register`], so the same ansatz differentiates on the CPU engine
//! or across a sharded cluster.
//!
//! # Quick start
//!
//! ```rust
//! use alsvid_engine::{CpuRegister, Register};
//! use alsvid_grad::{GradientDescent, evaluate, parameter_shift};
//! use alsvid_ir::{Circuit, Hamiltonian, PauliTerm};
//!
//! // One-parameter ansatz against ⟨Z⟩.
//! let mut circuit = Circuit::new(1);
//! circuit.ry(0.0, 0).unwrap();
//! let tape = circuit.to_tape();
//! let observable = Hamiltonian::single(PauliTerm::z(0, 1.0));
//!
//! let reg = CpuRegister::with_seed(1, 9).unwrap();
//! let outcome = GradientDescent::new()
//!     .with_learning_rate(0.4)
//!     .with_max_iterations(60)
//!     .minimize(
//!         |theta| evaluate(&mut reg.fork(), &tape, theta, &observable),
//!         |theta| parameter_shift(&mut reg.fork(), &tape, theta, &observable),
//!         vec![0.4],
//!     )
//!     .unwrap();
//!
//! // ⟨Z⟩ is minimized at θ = π where the energy is −1.
//! assert!(outcome.best_energy < -0.99);
//! ```
//!
//! [`Tape`]: alsvid_ir::Tape
//! [`Register`]: alsvid_engine::Register

pub mod differentiator;
pub mod optimizer;

pub use differentiator::{SHIFT, adjoint, evaluate, parameter_shift};
pub use optimizer::{Adam, GradientDescent, OptimizeOutcome, Spsa};
