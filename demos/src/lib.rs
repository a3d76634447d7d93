//! Shared problem definitions for the Alsvid demos.

use alsvid_ir::{Circuit, Hamiltonian, PauliString, PauliTerm};

/// H₂ molecule Hamiltonian at equilibrium bond distance, Jordan-Wigner
/// reduced to two qubits.
///
/// The variational minimum over the hardware-efficient ansatz sits below
/// −1.13 Hartree.
pub fn h2_hamiltonian() -> Hamiltonian {
    Hamiltonian::from_terms(vec![
        PauliTerm::new(-1.05237, PauliString::from_word("II").expect("static word")),
        PauliTerm::new(0.39794, PauliString::from_word("IZ").expect("static word")),
        PauliTerm::new(-0.39794, PauliString::from_word("ZI").expect("static word")),
        PauliTerm::new(-0.01128, PauliString::from_word("ZZ").expect("static word")),
        PauliTerm::new(0.18093, PauliString::from_word("XX").expect("static word")),
    ])
}

/// Hardware-efficient ansatz: an RY layer, then `reps` blocks of CNOT
/// ladder plus RY layer. Angles start at zero; the optimizer rebinds them
/// through the tape.
pub fn hardware_efficient_ansatz(num_qubits: u32, reps: usize) -> Circuit {
    let mut circuit = Circuit::new(num_qubits);
    for q in 0..num_qubits {
        circuit.ry(0.0, q).expect("layer qubit in range");
    }
    for _ in 0..reps {
        for q in 0..num_qubits.saturating_sub(1) {
            circuit.cnot(q, q + 1).expect("ladder qubit in range");
        }
        for q in 0..num_qubits {
            circuit.ry(0.0, q).expect("layer qubit in range");
        }
    }
    circuit
}

/// Trainable parameter count of [`hardware_efficient_ansatz`].
pub fn num_parameters(num_qubits: u32, reps: usize) -> usize {
    num_qubits as usize * (reps + 1)
}

/// Section header for demo output.
pub fn print_header(title: &str) {
    println!("\n=== {title} ===");
}
