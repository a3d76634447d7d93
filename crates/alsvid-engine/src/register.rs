//! Registers: the capability surface over a statevector.
//!
//! [`Register`] is the seam between the circuit level and a concrete
//! realization of the state. The CPU and sharded realizations are
//! interchangeable behind it, and the differentiators and optimizer drivers
//! are generic over it — static dispatch, no virtual calls in the hot path.

use alsvid_ir::{Circuit, Gate, Hamiltonian, PauliOp, PauliString, Tape};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::kernel;
use crate::preflight;
use crate::store::AmplitudeStore;

/// Below this probability mass a measurement outcome cannot be
/// renormalized and the measurement fails.
pub const DEGENERACY_FLOOR: f64 = 1e-18;

/// Capability set of a statevector realization.
///
/// The contract around errors is strict: a failed `apply`, `measure` or
/// exchange leaves the register in an indeterminate state, and the caller
/// must discard it.
pub trait Register: Sized {
    /// Total number of qubits (N).
    fn num_qubits(&self) -> usize;

    /// Return to the computational basis state 0. Clears any recorded tape.
    fn reset(&mut self);

    /// Apply one gate; measurement gates collapse and store their outcome.
    fn apply(&mut self, gate: Gate) -> SimResult<()>;

    /// Projectively measure one qubit, collapsing and renormalizing.
    fn measure(&mut self, target: u32) -> SimResult<bool>;

    /// Re⟨ψ|P|ψ⟩ for a single Pauli string.
    fn expectation_pauli(&self, pauli: &PauliString) -> SimResult<f64>;

    /// ⟨self|other⟩ over the full state.
    fn inner_product(&self, other: &Self) -> SimResult<Complex64>;

    /// An independent copy of the current amplitudes for scratch work.
    /// Recording state and tape are not carried over.
    fn fork(&self) -> Self;

    /// The locally stored amplitude slice (the full state for a
    /// single-process register, this rank's shard otherwise).
    fn local_amplitudes(&self) -> &[Complex64];

    /// Start appending applied gates to the tape, creating it if needed.
    fn enable_recording(&mut self);

    /// Stop recording and move the tape out of the register.
    fn take_tape(&mut self) -> Option<Tape>;

    /// Apply every operation of a circuit in order.
    fn run(&mut self, circuit: &Circuit) -> SimResult<()> {
        if circuit.num_qubits() as usize != self.num_qubits() {
            return Err(SimError::InvalidArgument(format!(
                "circuit spans {} qubits but the register has {}",
                circuit.num_qubits(),
                self.num_qubits()
            )));
        }
        for &op in circuit.ops() {
            self.apply(op)?;
        }
        Ok(())
    }

    /// Forward-replay a tape.
    fn run_tape(&mut self, tape: &Tape) -> SimResult<()> {
        for &gate in tape.entries() {
            self.apply(gate)?;
        }
        Ok(())
    }

    /// Reverse-replay a tape, applying each gate's inverse.
    fn rewind_tape(&mut self, tape: &Tape) -> SimResult<()> {
        for gate in tape.inverted()? {
            self.apply(gate)?;
        }
        Ok(())
    }

    /// Apply a Pauli string as a product of X/Y/Z gates.
    fn apply_pauli(&mut self, pauli: &PauliString) -> SimResult<()> {
        for &(target, op) in pauli.ops() {
            let gate = match op {
                PauliOp::X => Gate::X { target },
                PauliOp::Y => Gate::Y { target },
                PauliOp::Z => Gate::Z { target },
                PauliOp::I => continue,
            };
            self.apply(gate)?;
        }
        Ok(())
    }

    /// Re⟨ψ|H|ψ⟩ for a Pauli-sum Hamiltonian.
    fn expectation(&self, observable: &Hamiltonian) -> SimResult<f64> {
        let mut energy = 0.0;
        for term in observable.terms() {
            energy += term.coeff * self.expectation_pauli(&term.pauli)?;
        }
        Ok(energy)
    }

    /// Σ |amplitude|² over the full state. Distributed realizations reduce
    /// across ranks, which can fail with a transport error.
    fn norm_sqr(&self) -> SimResult<f64> {
        Ok(self.local_amplitudes().iter().map(Complex64::norm_sqr).sum())
    }
}

/// Single-process statevector register: the local qubit count equals the
/// total qubit count.
#[derive(Debug, Clone)]
pub struct CpuRegister {
    store: AmplitudeStore,
    rng: StdRng,
    tape: Option<Tape>,
    recording: bool,
    classical: Vec<bool>,
}

impl CpuRegister {
    /// Allocate a register of `num_qubits` qubits in the ground state, with
    /// an entropy-seeded measurement RNG.
    pub fn new(num_qubits: u32) -> SimResult<Self> {
        Self::from_rng(num_qubits, StdRng::from_entropy())
    }

    /// Allocate with a fixed RNG seed; measurement outcomes become
    /// deterministic, which the test suite relies on.
    pub fn with_seed(num_qubits: u32, seed: u64) -> SimResult<Self> {
        Self::from_rng(num_qubits, StdRng::seed_from_u64(seed))
    }

    fn from_rng(num_qubits: u32, rng: StdRng) -> SimResult<Self> {
        preflight::check_qubit_count(num_qubits)?;
        preflight::check_allocation(num_qubits, num_qubits, 1)?;
        debug!(num_qubits, "allocating cpu register");
        Ok(Self {
            store: AmplitudeStore::ground(num_qubits as usize),
            rng,
            tape: None,
            recording: false,
            classical: vec![false; num_qubits as usize],
        })
    }

    /// Outcomes of measurement gates, by classical slot.
    pub fn classical_bits(&self) -> &[bool] {
        &self.classical
    }

    /// |amplitude|² per basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.store.as_slice().iter().map(Complex64::norm_sqr).collect()
    }

    fn measure_qubit(&mut self, target: u32) -> SimResult<bool> {
        let t = target as usize;
        let p1 = kernel::probability_one(self.store.as_slice(), t);
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
        kernel::collapse(self.store.as_mut_slice(), t, outcome, p.sqrt().recip());
        trace!(target, outcome, p1, "measurement collapse");
        Ok(outcome)
    }
}

impl Register for CpuRegister {
    fn num_qubits(&self) -> usize {
        self.store.num_qubits()
    }

    fn reset(&mut self) {
        self.store.reset();
        self.classical.fill(false);
        if let Some(tape) = self.tape.as_mut() {
            tape.clear();
        }
    }

    fn apply(&mut self, gate: Gate) -> SimResult<()> {
        gate.validate(self.num_qubits() as u32)?;
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
                        self.store.num_qubits()
                    ))
                })?;
                *slot = outcome;
                Ok(())
            }
            unitary => kernel::apply_unitary(self.store.as_mut_slice(), &unitary),
        }
    }

    fn measure(&mut self, target: u32) -> SimResult<bool> {
        Gate::Measure { target, cbit: 0 }.validate(self.num_qubits() as u32)?;
        self.measure_qubit(target)
    }

    fn expectation_pauli(&self, pauli: &PauliString) -> SimResult<f64> {
        if pauli.is_identity() {
            return Ok(1.0);
        }
        let num_qubits = self.num_qubits() as u32;
        if let Some(q) = pauli.max_qubit() {
            if q >= num_qubits {
                return Err(SimError::InvalidArgument(format!(
                    "Pauli string references qubit {q} but the register has {num_qubits} qubits"
                )));
            }
        }
        let z_mask: usize = pauli.ops().iter().map(|(q, _)| 1usize << q).sum();
        if pauli.is_z_only() {
            return Ok(kernel::z_expectation(self.store.as_slice(), z_mask));
        }

        // X/Y positions: rotate a copy into the Z basis (H for X, H·S† for
        // Y), then take the Z-only path on the clone.
        let mut rotated = self.store.clone();
        for &(target, op) in pauli.ops() {
            match op {
                PauliOp::X => {
                    kernel::apply_unitary(rotated.as_mut_slice(), &Gate::H { target })?;
                }
                PauliOp::Y => {
                    kernel::apply_unitary(rotated.as_mut_slice(), &Gate::Sdg { target })?;
                    kernel::apply_unitary(rotated.as_mut_slice(), &Gate::H { target })?;
                }
                PauliOp::Z | PauliOp::I => {}
            }
        }
        Ok(kernel::z_expectation(rotated.as_slice(), z_mask))
    }

    fn inner_product(&self, other: &Self) -> SimResult<Complex64> {
        if self.num_qubits() != other.num_qubits() {
            return Err(SimError::InvalidArgument(format!(
                "inner product between registers of {} and {} qubits",
                self.num_qubits(),
                other.num_qubits()
            )));
        }
        Ok(kernel::inner_product(self.store.as_slice(), other.store.as_slice()))
    }

    fn fork(&self) -> Self {
        Self {
            store: self.store.clone(),
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn rejects_out_of_range_qubit_counts() {
        assert!(matches!(
            CpuRegister::new(0),
            Err(SimError::InvalidArgument(_))
        ));
        assert!(matches!(
            CpuRegister::new(31),
            Err(SimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bell_pair_amplitudes() {
        let mut reg = CpuRegister::with_seed(2, 7).unwrap();
        reg.run(&Circuit::bell()).unwrap();
        let amps = reg.local_amplitudes();
        assert!((amps[0b00].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((amps[0b11].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(amps[0b01].norm() < 1e-12);
        assert!(amps[0b10].norm() < 1e-12);
    }

    #[test]
    fn recording_captures_applied_gates() {
        let mut reg = CpuRegister::with_seed(2, 1).unwrap();
        reg.enable_recording();
        reg.run(&Circuit::bell()).unwrap();
        let tape = reg.take_tape().unwrap();
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.entries()[0], Gate::H { target: 0 });
    }

    #[test]
    fn measurement_gate_fills_classical_slot() {
        let mut reg = CpuRegister::with_seed(1, 3).unwrap();
        reg.apply(Gate::X { target: 0 }).unwrap();
        reg.apply(Gate::Measure { target: 0, cbit: 0 }).unwrap();
        assert_eq!(reg.classical_bits(), &[true]);
    }

    #[test]
    fn expectation_z_and_x() {
        let mut reg = CpuRegister::with_seed(1, 3).unwrap();
        // ⟨0|Z|0⟩ = 1, ⟨0|X|0⟩ = 0.
        let z = PauliString::from_word("Z").unwrap();
        let x = PauliString::from_word("X").unwrap();
        assert!((reg.expectation_pauli(&z).unwrap() - 1.0).abs() < 1e-12);
        assert!(reg.expectation_pauli(&x).unwrap().abs() < 1e-12);

        // After H: ⟨+|X|+⟩ = 1.
        reg.apply(Gate::H { target: 0 }).unwrap();
        assert!((reg.expectation_pauli(&x).unwrap() - 1.0).abs() < 1e-12);
        assert!(reg.expectation_pauli(&z).unwrap().abs() < 1e-12);
    }

    #[test]
    fn expectation_y_uses_basis_rotation() {
        // |i⟩ = S·H|0⟩ has ⟨Y⟩ = +1.
        let mut reg = CpuRegister::with_seed(1, 3).unwrap();
        reg.apply(Gate::H { target: 0 }).unwrap();
        reg.apply(Gate::S { target: 0 }).unwrap();
        let y = PauliString::from_word("Y").unwrap();
        assert!((reg.expectation_pauli(&y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fork_does_not_share_state() {
        let mut reg = CpuRegister::with_seed(1, 3).unwrap();
        let fork = reg.fork();
        reg.apply(Gate::X { target: 0 }).unwrap();
        assert_eq!(fork.local_amplitudes()[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn inner_product_of_orthogonal_states_vanishes() {
        let mut a = CpuRegister::with_seed(1, 3).unwrap();
        let b = a.fork();
        a.apply(Gate::X { target: 0 }).unwrap();
        assert!(a.inner_product(&b).unwrap().norm() < 1e-15);
    }
}
