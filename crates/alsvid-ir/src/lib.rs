//! Alsvid circuit intermediate representation.
//!
//! This crate provides the value types shared across the Alsvid simulator
//! stack: gate descriptors, the circuit builder, the recording tape used by
//! the differentiators, and Pauli-string observables.
//!
//! # Overview
//!
//! - **Gates**: [`Gate`] is one flat sum type per operation; inverses,
//!   generators and matrices are pure functions on the variant.
//! - **Circuits**: [`Circuit`] is an ordered, insert-validated operation
//!   list over a fixed qubit count.
//! - **Tape**: [`Tape`] records executed gates with resolved parameters and
//!   exposes the positional parameter mapping used for gradients.
//! - **Observables**: [`PauliString`], [`PauliTerm`] and [`Hamiltonian`].
//!
//! # Example: Building a Bell circuit
//!
//! ```rust
//! use alsvid_ir::Circuit;
//!
//! let mut circuit = Circuit::new(2);
//! circuit.h(0).unwrap().cnot(0, 1).unwrap();
//! assert_eq!(circuit.len(), 2);
//! ```
//!
//! # Example: A tape with trainable parameters
//!
//! ```rust
//! use alsvid_ir::{Gate, Tape};
//!
//! let tape: Tape = [
//!     Gate::Ry { target: 0, theta: 0.0 },
//!     Gate::Cnot { control: 0, target: 1 },
//!     Gate::Ry { target: 1, theta: 0.0 },
//! ]
//! .into_iter()
//! .collect();
//!
//! assert_eq!(tape.num_parameters(), 2);
//! let bound = tape.bind(&[0.3, -0.7]).unwrap();
//! assert_eq!(bound.parameters(), vec![0.3, -0.7]);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod pauli;
pub mod tape;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::Gate;
pub use matrix::Matrix2;
pub use pauli::{Hamiltonian, PauliOp, PauliString, PauliTerm};
pub use tape::Tape;
