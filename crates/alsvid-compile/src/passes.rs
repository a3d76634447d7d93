//! The optimization passes.
//!
//! All passes transform the flat operation list of a circuit and preserve
//! its semantics up to global phase. Measurements are hard barriers: no
//! pass removes, merges or moves across them.

use std::collections::BTreeMap;

use alsvid_ir::{Gate, Matrix2};
use tracing::debug;

/// A transformation over a circuit's operation list.
pub trait Pass {
    /// Name for diagnostics.
    fn name(&self) -> &'static str;

    /// Transform the operation list in place.
    fn run(&self, ops: &mut Vec<Gate>);
}

/// Bound on fixpoint sweeps, against pathological inputs.
const MAX_SWEEPS: usize = 100;

/// Cancel adjacent gate pairs whose product is the identity.
///
/// Covers single-qubit pairs via their 2×2 product (so H·H, X·X,
/// Rz(θ)·Rz(−θ), T·T† all cancel) and identical self-inverse multi-qubit
/// pairs (CNOT, CZ, SWAP, Toffoli). Two gates are adjacent when no other
/// operation touches any of their qubits in between.
pub struct CancelAdjacentInverses;

impl CancelAdjacentInverses {
    fn cancels(first: &Gate, second: &Gate) -> bool {
        if first.is_single_qubit()
            && second.is_single_qubit()
            && first.qubits() == second.qubits()
        {
            if let (Some(m1), Some(m2)) = (first.single_qubit_matrix(), second.single_qubit_matrix())
            {
                return m2.mul(&m1).is_identity();
            }
        }
        match (*first, *second) {
            (Gate::Cnot { control: c1, target: t1 }, Gate::Cnot { control: c2, target: t2 }) => {
                c1 == c2 && t1 == t2
            }
            (Gate::Cz { control: c1, target: t1 }, Gate::Cz { control: c2, target: t2 }) => {
                // CZ is symmetric in its operands.
                (c1, t1) == (c2, t2) || (c1, t1) == (t2, c2)
            }
            (Gate::Swap { a: a1, b: b1 }, Gate::Swap { a: a2, b: b2 }) => {
                (a1, b1) == (a2, b2) || (a1, b1) == (b2, a2)
            }
            (
                Gate::Toffoli { controls: c1, target: t1 },
                Gate::Toffoli { controls: c2, target: t2 },
            ) => t1 == t2 && (c1 == c2 || (c1[0] == c2[1] && c1[1] == c2[0])),
            _ => false,
        }
    }

    /// One sweep; true if anything was removed.
    fn sweep(ops: &mut Vec<Gate>) -> bool {
        let mut removed = false;
        let mut i = 0;
        'scan: while i < ops.len() {
            let gate = ops[i];
            if matches!(gate, Gate::Measure { .. }) {
                i += 1;
                continue;
            }
            let qubits = gate.qubits();
            // The first later op touching any of our qubits is the only
            // adjacency candidate; anything else blocks.
            for j in i + 1..ops.len() {
                let other = ops[j];
                if qubits.iter().any(|q| other.qubits().contains(q)) {
                    if Self::cancels(&gate, &other) {
                        ops.remove(j);
                        ops.remove(i);
                        removed = true;
                        continue 'scan;
                    }
                    break;
                }
            }
            i += 1;
        }
        removed
    }
}

impl Pass for CancelAdjacentInverses {
    fn name(&self) -> &'static str {
        "CancelAdjacentInverses"
    }

    fn run(&self, ops: &mut Vec<Gate>) {
        let before = ops.len();
        for _ in 0..MAX_SWEEPS {
            if !Self::sweep(ops) {
                break;
            }
        }
        debug!(pass = self.name(), before, after = ops.len(), "pass complete");
    }
}

/// Fuse maximal runs of single-qubit gates on each qubit into one 2×2
/// unitary.
///
/// A run is flushed when a multi-qubit gate or a measurement touches its
/// qubit. Identity products vanish; single-gate runs pass through
/// unchanged.
pub struct FuseSingleQubitRuns;

impl FuseSingleQubitRuns {
    fn flush(target: u32, run: Vec<Gate>, out: &mut Vec<Gate>) {
        match run.len() {
            0 => {}
            1 => out.push(run[0]),
            _ => {
                // Gates apply left to right, so the product accumulates on
                // the left.
                let mut product = Matrix2::identity();
                for gate in &run {
                    if let Some(m) = gate.single_qubit_matrix() {
                        product = m.mul(&product);
                    }
                }
                if !product.is_identity() {
                    out.push(Gate::Fused {
                        target,
                        matrix: product,
                    });
                }
            }
        }
    }
}

impl Pass for FuseSingleQubitRuns {
    fn name(&self) -> &'static str {
        "FuseSingleQubitRuns"
    }

    fn run(&self, ops: &mut Vec<Gate>) {
        let before = ops.len();
        let mut pending: BTreeMap<u32, Vec<Gate>> = BTreeMap::new();
        let mut out: Vec<Gate> = Vec::with_capacity(ops.len());

        for gate in ops.drain(..) {
            if gate.is_single_qubit() {
                pending.entry(gate.qubits()[0]).or_default().push(gate);
            } else {
                for q in gate.qubits() {
                    if let Some(run) = pending.remove(&q) {
                        Self::flush(q, run, &mut out);
                    }
                }
                out.push(gate);
            }
        }
        for (q, run) in pending {
            Self::flush(q, run, &mut out);
        }

        *ops = out;
        debug!(pass = self.name(), before, after = ops.len(), "pass complete");
    }
}

/// Sift single-qubit gates left past commuting neighbors so fusion runs
/// grow longer.
///
/// A single-qubit gate moves past any operation on disjoint qubits, and
/// past an operation sharing its qubit when both are diagonal. Nothing
/// moves across a measurement.
pub struct ReorderCommuting;

impl ReorderCommuting {
    fn may_pass(moving: &Gate, over: &Gate) -> bool {
        if matches!(over, Gate::Measure { .. }) {
            return false;
        }
        let target = moving.qubits()[0];
        if !over.qubits().contains(&target) {
            return true;
        }
        moving.is_diagonal() && over.is_diagonal()
    }
}

impl Pass for ReorderCommuting {
    fn name(&self) -> &'static str {
        "ReorderCommuting"
    }

    fn run(&self, ops: &mut Vec<Gate>) {
        for j in 1..ops.len() {
            if !ops[j].is_single_qubit() {
                continue;
            }
            let mut k = j;
            while k > 0 {
                let moving = ops[k];
                let over = ops[k - 1];
                // Stop at the previous single-qubit gate on the same wire:
                // that is the fusion partner we are sifting toward.
                if over.is_single_qubit() && over.qubits() == moving.qubits() {
                    break;
                }
                if !Self::may_pass(&moving, &over) {
                    break;
                }
                ops.swap(k - 1, k);
                k -= 1;
            }
        }
        debug!(pass = self.name(), "pass complete");
    }
}
