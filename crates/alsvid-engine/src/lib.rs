//! Alsvid statevector evolution engine.
//!
//! Owns the 2^N complex amplitudes and evolves them in place under gate
//! kernels. The memory-bound pair walk — disjoint amplitude pairs at stride
//! 2^t — is parallelized with a rayon fork-join over contiguous blocks and
//! vectorized with an AVX2+FMA path when the stride permits double-pair
//! loads; the stride-1 case and all tails take the scalar form.
//!
//! Measurement is projective with collapse and renormalization, driven by a
//! per-register RNG seeded at construction. Expectation values of Pauli
//! strings take a Z-only fast path and basis-rotate a forked copy for X/Y
//! positions.
//!
//! # Quick start
//!
//! ```rust
//! use alsvid_engine::{CpuRegister, Register};
//! use alsvid_ir::Circuit;
//!
//! let mut reg = CpuRegister::with_seed(2, 42).unwrap();
//! reg.run(&Circuit::bell()).unwrap();
//!
//! let p11 = reg.local_amplitudes()[0b11].norm_sqr();
//! assert!((p11 - 0.5).abs() < 1e-12);
//! ```
//!
//! Realizations other than [`CpuRegister`] (the sharded register of
//! `alsvid-dist`) implement the same [`Register`] capability set, so the
//! differentiation and optimization layers run unchanged on any of them.

pub mod error;
pub mod kernel;
pub mod preflight;
pub mod register;
pub mod simd;
pub mod store;

pub use error::{SimError, SimResult};
pub use preflight::MAX_QUBITS;
pub use register::{CpuRegister, DEGENERACY_FLOOR, Register};
pub use store::AmplitudeStore;
