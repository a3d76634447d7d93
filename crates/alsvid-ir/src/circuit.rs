//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::IrResult;
use crate::gate::Gate;
use crate::matrix::Matrix2;
use crate::tape::Tape;

/// An ordered quantum circuit over a fixed number of qubits.
///
/// Operations are validated when inserted, so a constructed circuit is
/// always structurally sound for its qubit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: u32,
    ops: Vec<Gate>,
}

impl Circuit {
    /// Create an empty circuit over `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            ops: vec![],
        }
    }

    /// Append a gate, validating its operands.
    pub fn push(&mut self, gate: Gate) -> IrResult<&mut Self> {
        gate.validate(self.num_qubits)?;
        self.ops.push(gate);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply a Hadamard gate.
    pub fn h(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::H { target })
    }

    /// Apply a Pauli-X gate.
    pub fn x(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::X { target })
    }

    /// Apply a Pauli-Y gate.
    pub fn y(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Y { target })
    }

    /// Apply a Pauli-Z gate.
    pub fn z(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Z { target })
    }

    /// Apply an S gate.
    pub fn s(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::S { target })
    }

    /// Apply an S-dagger gate.
    pub fn sdg(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Sdg { target })
    }

    /// Apply a T gate.
    pub fn t(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::T { target })
    }

    /// Apply a T-dagger gate.
    pub fn tdg(&mut self, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Tdg { target })
    }

    /// Apply an RX rotation.
    pub fn rx(&mut self, theta: f64, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Rx { target, theta })
    }

    /// Apply an RY rotation.
    pub fn ry(&mut self, theta: f64, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Ry { target, theta })
    }

    /// Apply an RZ rotation.
    pub fn rz(&mut self, theta: f64, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Rz { target, theta })
    }

    /// Apply a phase gate.
    pub fn phase(&mut self, phi: f64, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Phase { target, phi })
    }

    /// Apply an arbitrary 2×2 unitary.
    pub fn unitary(&mut self, matrix: Matrix2, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Fused { target, matrix })
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply a CNOT gate.
    pub fn cnot(&mut self, control: u32, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Cnot { control, target })
    }

    /// Apply a CZ gate.
    pub fn cz(&mut self, control: u32, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Cz { control, target })
    }

    /// Apply a SWAP gate.
    pub fn swap(&mut self, a: u32, b: u32) -> IrResult<&mut Self> {
        self.push(Gate::Swap { a, b })
    }

    /// Apply a Toffoli gate.
    pub fn toffoli(&mut self, c0: u32, c1: u32, target: u32) -> IrResult<&mut Self> {
        self.push(Gate::Toffoli {
            controls: [c0, c1],
            target,
        })
    }

    /// Measure a qubit into a classical register slot.
    pub fn measure(&mut self, target: u32, cbit: u32) -> IrResult<&mut Self> {
        self.push(Gate::Measure { target, cbit })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The ordered operation list.
    pub fn ops(&self) -> &[Gate] {
        &self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Snapshot the operation list as a tape, for differentiation without
    /// re-recording through a register.
    pub fn to_tape(&self) -> Tape {
        self.ops.iter().copied().collect()
    }

    /// Rebuild a circuit from a validated operation list.
    ///
    /// Used by the optimization pre-pass, which transforms op lists it
    /// obtained from an already-validated circuit.
    pub fn from_ops(num_qubits: u32, ops: Vec<Gate>) -> IrResult<Self> {
        for op in &ops {
            op.validate(num_qubits)?;
        }
        Ok(Self { num_qubits, ops })
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// A Bell pair: H(0), CNOT(0, 1).
    pub fn bell() -> Self {
        let mut c = Self::new(2);
        c.h(0).and_then(|c| c.cnot(0, 1)).expect("static circuit");
        c
    }

    /// A GHZ chain on `n` qubits: H(0) followed by a CNOT ladder.
    pub fn ghz(n: u32) -> Self {
        let mut c = Self::new(n);
        if n == 0 {
            return c;
        }
        c.h(0).expect("static circuit");
        for i in 0..n - 1 {
            c.cnot(i, i + 1).expect("static circuit");
        }
        c
    }
}
