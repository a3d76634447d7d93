//! Pauli-string observables.
//!
//! A Hamiltonian is a sum of weighted Pauli strings:
//!
//!   H = Σ_k  c_k · P_k
//!
//! where each P_k is a tensor product of single-qubit Pauli operators
//! (I, X, Y, Z) and c_k ∈ ℝ.

use serde::{Deserialize, Serialize};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity — contributes only a constant offset.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

/// A tensor product of Pauli operators on indexed qubits.
///
/// Stored as a sorted `Vec<(qubit_index, PauliOp)>` with identity terms
/// omitted. Qubits not listed are implicitly I.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauliString {
    /// Non-identity terms, sorted by qubit index ascending.
    ops: Vec<(u32, PauliOp)>,
}

impl PauliString {
    /// Construct from an iterator of (qubit, op) pairs.
    ///
    /// Identity operators are dropped; the remaining ops are sorted by qubit.
    pub fn from_ops(ops: impl IntoIterator<Item = (u32, PauliOp)>) -> Self {
        let mut v: Vec<(u32, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// Parse a word like `"IZXY"` where position q acts on qubit q.
    ///
    /// Returns `None` on characters outside {I, X, Y, Z}.
    pub fn from_word(word: &str) -> Option<Self> {
        let mut ops = Vec::new();
        for (q, ch) in word.chars().enumerate() {
            let op = match ch {
                'I' | 'i' => PauliOp::I,
                'X' | 'x' => PauliOp::X,
                'Y' | 'y' => PauliOp::Y,
                'Z' | 'z' => PauliOp::Z,
                _ => return None,
            };
            ops.push((q as u32, op));
        }
        Some(Self::from_ops(ops))
    }

    /// The non-identity (qubit, op) pairs, sorted by qubit index.
    pub fn ops(&self) -> &[(u32, PauliOp)] {
        &self.ops
    }

    /// True if there are no non-identity operators.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if every operator in the string is Z.
    pub fn is_z_only(&self) -> bool {
        self.ops.iter().all(|(_, op)| *op == PauliOp::Z)
    }

    /// The highest qubit index referenced, or `None` for an identity string.
    pub fn max_qubit(&self) -> Option<u32> {
        self.ops.last().map(|(q, _)| *q)
    }
}

/// A single weighted Pauli term: `coeff · pauli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl PauliTerm {
    /// Create a new term.
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }

    /// Shorthand: constant (identity) offset.
    pub fn identity(coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([]))
    }

    /// Shorthand: single-qubit Z term.
    pub fn z(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::Z)]))
    }

    /// Shorthand: single-qubit X term.
    pub fn x(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::X)]))
    }

    /// Shorthand: ZZ coupling term.
    pub fn zz(q0: u32, q1: u32, coeff: f64) -> Self {
        Self::new(
            coeff,
            PauliString::from_ops([(q0, PauliOp::Z), (q1, PauliOp::Z)]),
        )
    }

    /// Shorthand: XX coupling term.
    pub fn xx(q0: u32, q1: u32, coeff: f64) -> Self {
        Self::new(
            coeff,
            PauliString::from_ops([(q0, PauliOp::X), (q1, PauliOp::X)]),
        )
    }
}

/// A sum-of-Pauli-strings Hamiltonian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hamiltonian {
    terms: Vec<PauliTerm>,
}

impl Hamiltonian {
    /// Create from a list of terms.
    pub fn from_terms(terms: Vec<PauliTerm>) -> Self {
        Self { terms }
    }

    /// A single-term Hamiltonian.
    pub fn single(term: PauliTerm) -> Self {
        Self { terms: vec![term] }
    }

    /// All terms.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// The minimum number of qubits required to represent this Hamiltonian.
    pub fn min_qubits(&self) -> u32 {
        self.terms
            .iter()
            .filter_map(|t| t.pauli.max_qubit())
            .max()
            .map_or(0, |q| q + 1)
    }
}

impl FromIterator<PauliTerm> for Hamiltonian {
    fn from_iter<T: IntoIterator<Item = PauliTerm>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
