//! Alsvid distribution layer.
//!
//! Shards a 2^N statevector across 2^R ranks: each rank owns a contiguous
//! 2^(N−R) slice, the high N−L qubits live in the rank id, and gates on
//! those global qubits run a pairwise buffer exchange between partner
//! ranks. The sharded register implements the same [`Register`] capability
//! set as the single-process engine, so circuits, differentiators and
//! optimizers run on it unchanged.
//!
//! The transport is abstracted behind [`Transport`]; [`LocalCluster`]
//! provides an in-process channel mesh so the protocol is exercised with
//! plain threads:
//!
//! ```rust
//! use alsvid_dist::{LocalCluster, ShardedRegister};
//! use alsvid_engine::Register;
//! use alsvid_ir::Circuit;
//! use std::thread;
//!
//! let endpoints = LocalCluster::connect(2).unwrap();
//! let handles: Vec<_> = endpoints
//!     .into_iter()
//!     .map(|t| {
//!         thread::spawn(move || {
//!             let mut reg = ShardedRegister::new(3, t, 7).unwrap();
//!             reg.run(&Circuit::ghz(3)).unwrap();
//!             reg.local_amplitudes().to_vec()
//!         })
//!     })
//!     .collect();
//! let shards: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
//! // Rank 0 holds the |000⟩ amplitude, rank 1 the |111⟩ amplitude.
//! assert!((shards[0][0].re - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
//! assert!((shards[1][3].re - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
//! ```

pub mod register;
pub mod transport;

pub use register::ShardedRegister;
pub use transport::{ChannelTransport, LocalCluster, Transport};

// The trait is re-exported so downstream code can depend on this crate
// alone when it only drives sharded registers.
pub use alsvid_engine::Register;
