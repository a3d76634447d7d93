//! The sharded register.
//!
//! Each rank owns a 2^L slice of the global 2^N state; the remaining N − L
//! qubits are rank qubits, encoded in the rank id. Qubit t is local on a
//! rank iff t < L, otherwise bit (t − L) of the rank id carries its value.
//!
//! Gates whose operands are all local run the ordinary engine kernels.
//! A gate on a global qubit runs the pairwise exchange: partner rank is
//! `rank XOR 2^(t−L)`, both partners swap full buffers, and each computes
//! only its own half of the output. Diagonal gates never exchange — the
//! rank bit selects the diagonal element. Every exchange is a synchronous
//! rendezvous, so gate k+1 cannot begin anywhere before gate k has finished
//! on both partners of every pair it touched.

use std::sync::{Arc, Mutex};

use alsvid_ir::{Gate, PauliOp, PauliString, Tape};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use alsvid_engine::register::DEGENERACY_FLOOR;
use alsvid_engine::{AmplitudeStore, Register, SimError, SimResult, kernel, preflight};

use crate::transport::Transport;

/// One rank's shard of a distributed statevector.
///
/// All ranks must construct their registers with the same seed and drive
/// them through the same circuit-level control flow; measurement outcomes
/// then agree without an extra broadcast.
pub struct ShardedRegister<T: Transport> {
    store: AmplitudeStore,
    scratch: Vec<Complex64>,
    num_qubits: u32,
    local_qubits: u32,
    rank: usize,
    transport: Arc<Mutex<T>>,
    rng: StdRng,
    tape: Option<Tape>,
    recording: bool,
    classical: Vec<bool>,
}

impl<T: Transport> ShardedRegister<T> {
    /// Allocate this rank's shard of an `num_qubits`-qubit register.
    ///
    /// The world size must be a power of two and small enough to leave at
    /// least one local qubit per rank.
    pub fn new(num_qubits: u32, transport: T, seed: u64) -> SimResult<Self> {
        preflight::check_qubit_count(num_qubits)?;
        let world = transport.world_size();
        let rank = transport.rank();
        if !world.is_power_of_two() {
            return Err(SimError::InvalidArgument(format!(
                "world size must be a power of two, got {world}"
            )));
        }
        let rank_qubits = world.trailing_zeros();
        if rank_qubits >= num_qubits {
            return Err(SimError::InvalidArgument(format!(
                "{world} ranks leave no local qubits on a {num_qubits}-qubit register"
            )));
        }
        let local_qubits = num_qubits - rank_qubits;
        // The shard and its exchange scratch buffer are both 2^L.
        preflight::check_allocation(num_qubits, local_qubits, 2)?;
        debug!(num_qubits, local_qubits, rank, world, "allocating sharded register");

        let store = if rank == 0 {
            AmplitudeStore::ground(local_qubits as usize)
        } else {
            AmplitudeStore::zeroed(local_qubits as usize)
        };
        let scratch = vec![Complex64::new(0.0, 0.0); store.size()];
        Ok(Self {
            store,
            scratch,
            num_qubits,
            local_qubits,
            rank,
            transport: Arc::new(Mutex::new(transport)),
            rng: StdRng::seed_from_u64(seed),
            tape: None,
            recording: false,
            classical: vec![false; num_qubits as usize],
        })
    }

    /// This rank's id.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Locally stored qubit count (L).
    pub fn local_qubits(&self) -> u32 {
        self.local_qubits
    }

    /// Outcomes of measurement gates, by classical slot.
    pub fn classical_bits(&self) -> &[bool] {
        &self.classical
    }

    fn is_local(&self, qubit: u32) -> bool {
        qubit < self.local_qubits
    }

    /// Value of a global qubit on this rank, from the rank id.
    fn rank_bit(&self, qubit: u32) -> bool {
        (self.rank >> (qubit - self.local_qubits)) & 1 == 1
    }

    fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> SimResult<R>) -> SimResult<R> {
        let mut guard = self.transport.lock().map_err(|_| SimError::DistributedTransport {
            partner: self.rank,
            reason: "transport handle poisoned".to_string(),
        })?;
        f(&mut guard)
    }

    fn allreduce(&self, value: f64) -> SimResult<f64> {
        self.with_transport(|t| t.allreduce_sum(value))
    }

    /// Full buffer swap with the partner across a global qubit; the
    /// partner's buffer lands in the scratch space.
    fn exchange_across(&mut self, qubit: u32) -> SimResult<()> {
        let partner = self.rank ^ (1usize << (qubit - self.local_qubits));
        trace!(qubit, partner, "pairwise exchange");
        let store = self.store.as_slice();
        let scratch = &mut self.scratch;
        let mut guard = self.transport.lock().map_err(|_| SimError::DistributedTransport {
            partner,
            reason: "transport handle poisoned".to_string(),
        })?;
        guard.exchange(partner, store, scratch)
    }

    /// Route one unitary to the local kernels or the exchange protocol.
    fn dispatch_unitary(&mut self, gate: &Gate) -> SimResult<()> {
        if gate.qubits().iter().all(|&q| self.is_local(q)) {
            return kernel::apply_unitary(self.store.as_mut_slice(), gate);
        }
        match *gate {
            // Diagonal single-qubit gates on a global qubit: the rank bit
            // selects the diagonal element, no exchange needed.
            Gate::Z { target }
            | Gate::S { target }
            | Gate::Sdg { target }
            | Gate::T { target }
            | Gate::Tdg { target }
            | Gate::Rz { target, .. }
            | Gate::Phase { target, .. } => self.scale_by_diagonal(gate, target),
            Gate::Fused { target, matrix } if matrix.is_diagonal() => {
                self.scale_by_diagonal(gate, target)
            }

            // X on a global qubit is a pure buffer swap between partners.
            Gate::X { target } => self.controlled_flip(&[], target),

            // Generic dense 1-qubit gate on a global qubit: exchange, then
            // each rank computes its own half of the output.
            Gate::H { target } | Gate::Y { target } | Gate::Fused { target, .. } => {
                self.dense_on_global(gate, target)
            }
            Gate::Rx { target, .. } | Gate::Ry { target, .. } => {
                self.dense_on_global(gate, target)
            }

            Gate::Cnot { control, target } => self.controlled_flip(&[control], target),
            Gate::Toffoli { controls, target } => self.controlled_flip(&controls, target),

            Gate::Cz { control, target } => self.cz_mixed(control, target),

            // SWAP with a global operand lowers to its CNOT ladder.
            Gate::Swap { a, b } => {
                self.dispatch_unitary(&Gate::Cnot { control: a, target: b })?;
                self.dispatch_unitary(&Gate::Cnot { control: b, target: a })?;
                self.dispatch_unitary(&Gate::Cnot { control: a, target: b })
            }

            Gate::Measure { .. } => Err(SimError::InvalidArgument(
                "measurement cannot be applied as a unitary kernel".into(),
            )),
        }
    }

    /// Multiply the whole shard by the diagonal element this rank's bit
    /// selects.
    fn scale_by_diagonal(&mut self, gate: &Gate, target: u32) -> SimResult<()> {
        let m = gate.single_qubit_matrix().ok_or_else(|| {
            SimError::InvalidArgument(format!("gate '{}' has no 1-qubit matrix", gate.name()))
        })?;
        let d = if self.rank_bit(target) { m.data[3] } else { m.data[0] };
        if d != Complex64::new(1.0, 0.0) {
            for amp in self.store.as_mut_slice() {
                *amp *= d;
            }
        }
        Ok(())
    }

    fn dense_on_global(&mut self, gate: &Gate, target: u32) -> SimResult<()> {
        let m = gate.single_qubit_matrix().ok_or_else(|| {
            SimError::InvalidArgument(format!("gate '{}' has no 1-qubit matrix", gate.name()))
        })?;
        self.exchange_across(target)?;
        let rank_bit = self.rank_bit(target);
        kernel::combine_exchanged(self.store.as_mut_slice(), &self.scratch, &m, rank_bit);
        Ok(())
    }

    /// X on `target` under any mix of local and global controls; an empty
    /// control list is a plain X.
    ///
    /// Global controls are resolved against the rank id — both partners of
    /// a target exchange share every non-target rank bit, so the
    /// participate/skip decision is identical on both sides of the
    /// rendezvous.
    fn controlled_flip(&mut self, controls: &[u32], target: u32) -> SimResult<()> {
        let mut local_mask = 0usize;
        for &c in controls {
            if self.is_local(c) {
                local_mask |= 1usize << c;
            } else if !self.rank_bit(c) {
                return Ok(());
            }
        }
        if self.is_local(target) {
            kernel::apply_controlled_x(self.store.as_mut_slice(), target as usize, local_mask);
            return Ok(());
        }
        self.exchange_across(target)?;
        let store = self.store.as_mut_slice();
        if local_mask == 0 {
            store.copy_from_slice(&self.scratch);
        } else {
            // Both ranks overwrite exactly the amplitudes whose local
            // control bits are set, reassembling a consistent joint state.
            for (i, amp) in store.iter_mut().enumerate() {
                if i & local_mask == local_mask {
                    *amp = self.scratch[i];
                }
            }
        }
        Ok(())
    }

    /// CZ with at least one global operand. CZ is diagonal, so the global
    /// bits collapse to a rank-local decision.
    fn cz_mixed(&mut self, a: u32, b: u32) -> SimResult<()> {
        match (self.is_local(a), self.is_local(b)) {
            (false, false) => {
                if self.rank_bit(a) && self.rank_bit(b) {
                    for amp in self.store.as_mut_slice() {
                        *amp = -*amp;
                    }
                }
                Ok(())
            }
            (false, true) | (true, false) => {
                let (global, local) = if self.is_local(a) { (b, a) } else { (a, b) };
                if self.rank_bit(global) {
                    kernel::apply_unitary(self.store.as_mut_slice(), &Gate::Z { target: local })
                } else {
                    Ok(())
                }
            }
            (true, true) => kernel::apply_unitary(self.store.as_mut_slice(), &Gate::Cz {
                control: a,
                target: b,
            }),
        }
    }

    fn measure_qubit(&mut self, target: u32) -> SimResult<bool> {
        let local_p1 = if self.is_local(target) {
            kernel::probability_one(self.store.as_slice(), target as usize)
        } else if self.rank_bit(target) {
            self.store.norm_sqr()
        } else {
            0.0
        };
        let p1 = self.allreduce(local_p1)?;

        // Identical seeds and lockstep draws keep every rank's outcome in
        // agreement.
        let r: f64 = self.rng.r#gen();
        let outcome = r < p1;
        let p = if outcome { p1 } else { 1.0 - p1 };
        if p < DEGENERACY_FLOOR {
            return Err(SimError::NumericallyDegenerate {
                qubit: target,
                outcome,
                probability: p,
            });
        }
        let scale = p.sqrt().recip();
        if self.is_local(target) {
            kernel::collapse(self.store.as_mut_slice(), target as usize, outcome, scale);
        } else if self.rank_bit(target) == outcome {
            self.store.scale(scale);
        } else {
            self.store.zero();
        }
        trace!(target, outcome, p1, "distributed measurement collapse");
        Ok(outcome)
    }

    /// Z-expectation of a rotated (or Z-only) string: local signed sum,
    /// fixed rank sign for global Z bits, then one all-reduce.
    fn z_expectation_global(&self, pauli: &PauliString) -> SimResult<f64> {
        let mut local_mask = 0usize;
        let mut rank_sign = 1.0;
        for &(q, _) in pauli.ops() {
            if self.is_local(q) {
                local_mask |= 1usize << q;
            } else if self.rank_bit(q) {
                rank_sign = -rank_sign;
            }
        }
        let local = kernel::z_expectation(self.store.as_slice(), local_mask);
        self.allreduce(rank_sign * local)
    }
}

impl<T: Transport> Register for ShardedRegister<T> {
    fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    fn reset(&mut self) {
        if self.rank == 0 {
            self.store.reset();
        } else {
            self.store.zero();
        }
        self.classical.fill(false);
        if let Some(tape) = self.tape.as_mut() {
            tape.clear();
        }
    }

    fn apply(&mut self, gate: Gate) -> SimResult<()> {
        gate.validate(self.num_qubits)?;
        if self.recording {
            if let Some(tape) = self.tape.as_mut() {
                tape.push(gate);
            }
        }
        match gate {
            Gate::Measure { target, cbit } => {
                let outcome = self.measure_qubit(target)?;
                let slot = self.classical.get_mut(cbit as usize).ok_or_else(|| {
                    SimError::InvalidArgument(format!(
                        "classical slot {cbit} out of range for {} bits",
                        self.num_qubits
                    ))
                })?;
                *slot = outcome;
                Ok(())
            }
            unitary => self.dispatch_unitary(&unitary),
        }
    }

    fn measure(&mut self, target: u32) -> SimResult<bool> {
        Gate::Measure { target, cbit: 0 }.validate(self.num_qubits)?;
        self.measure_qubit(target)
    }

    fn expectation_pauli(&self, pauli: &PauliString) -> SimResult<f64> {
        if pauli.is_identity() {
            return Ok(1.0);
        }
        if let Some(q) = pauli.max_qubit() {
            if q >= self.num_qubits {
                return Err(SimError::InvalidArgument(format!(
                    "Pauli string references qubit {q} but the register has {} qubits",
                    self.num_qubits
                )));
            }
        }
        if pauli.is_z_only() {
            return self.z_expectation_global(pauli);
        }

        // Basis-rotate a fork; the rotations run in lockstep on every rank,
        // so global-qubit rotations pair up their exchanges correctly.
        let mut rotated = self.fork();
        for &(target, op) in pauli.ops() {
            match op {
                PauliOp::X => rotated.dispatch_unitary(&Gate::H { target })?,
                PauliOp::Y => {
                    rotated.dispatch_unitary(&Gate::Sdg { target })?;
                    rotated.dispatch_unitary(&Gate::H { target })?;
                }
                PauliOp::Z | PauliOp::I => {}
            }
        }
        rotated.z_expectation_global(pauli)
    }

    fn inner_product(&self, other: &Self) -> SimResult<Complex64> {
        if self.num_qubits != other.num_qubits {
            return Err(SimError::InvalidArgument(format!(
                "inner product between registers of {} and {} qubits",
                self.num_qubits, other.num_qubits
            )));
        }
        let local = kernel::inner_product(self.store.as_slice(), other.store.as_slice());
        let re = self.allreduce(local.re)?;
        let im = self.allreduce(local.im)?;
        Ok(Complex64::new(re, im))
    }

    fn fork(&self) -> Self {
        Self {
            store: self.store.clone(),
            scratch: self.scratch.clone(),
            num_qubits: self.num_qubits,
            local_qubits: self.local_qubits,
            rank: self.rank,
            transport: Arc::clone(&self.transport),
            rng: self.rng.clone(),
            tape: None,
            recording: false,
            classical: self.classical.clone(),
        }
    }

    fn local_amplitudes(&self) -> &[Complex64] {
        self.store.as_slice()
    }

    fn enable_recording(&mut self) {
        if self.tape.is_none() {
            self.tape = Some(Tape::new());
        }
        self.recording = true;
    }

    fn take_tape(&mut self) -> Option<Tape> {
        self.recording = false;
        self.tape.take()
    }

    fn norm_sqr(&self) -> SimResult<f64> {
        self.allreduce(self.store.norm_sqr())
    }
}
