//! Distributed equivalence: the concatenated shards computed across 2 and
//! 4 ranks must match the single-process state amplitude-wise.

use alsvid_dist::{LocalCluster, ShardedRegister};
use alsvid_engine::{CpuRegister, Register};
use alsvid_ir::{Circuit, Hamiltonian, PauliString, PauliTerm};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::thread;

const SEED: u64 = 1234;

/// Run a circuit on every rank of an in-process cluster and concatenate
/// the shards in rank order.
fn run_distributed(circuit: &Circuit, world: usize) -> Vec<Complex64> {
    let endpoints = LocalCluster::connect(world).unwrap();
    let handles: Vec<_> = endpoints
        .into_iter()
        .map(|transport| {
            let circuit = circuit.clone();
            thread::spawn(move || {
                let mut reg =
                    ShardedRegister::new(circuit.num_qubits(), transport, SEED).unwrap();
                reg.run(&circuit).unwrap();
                reg.local_amplitudes().to_vec()
            })
        })
        .collect();
    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

fn run_single(circuit: &Circuit) -> Vec<Complex64> {
    let mut reg = CpuRegister::with_seed(circuit.num_qubits(), SEED).unwrap();
    reg.run(circuit).unwrap();
    reg.local_amplitudes().to_vec()
}

fn assert_states_match(circuit: &Circuit, world: usize) {
    let single = run_single(circuit);
    let sharded = run_distributed(circuit, world);
    assert_eq!(single.len(), sharded.len());
    for (i, (a, b)) in single.iter().zip(sharded.iter()).enumerate() {
        assert!(
            (a - b).norm() < 1e-12,
            "amplitude {i} diverges across {world} ranks: {a} vs {b}"
        );
    }
}

/// A circuit that drives every exchange path: dense, diagonal and flip
/// gates on global qubits, plus all mixed CNOT/Toffoli/CZ/SWAP cases.
fn mixed_circuit() -> Circuit {
    let mut c = Circuit::new(4);
    c.h(0).unwrap();
    c.h(3).unwrap(); // dense gate on a global qubit (world 2 and 4)
    c.cnot(0, 3).unwrap(); // local control, global target
    c.cnot(3, 1).unwrap(); // global control, local target
    c.cnot(3, 2).unwrap(); // global control, global target at world 4
    c.rz(0.37, 3).unwrap(); // diagonal on a global qubit
    c.rx(-1.1, 2).unwrap();
    c.t(3).unwrap();
    c.y(3).unwrap();
    c.cz(2, 3).unwrap();
    c.cz(3, 0).unwrap();
    c.swap(1, 3).unwrap();
    c.toffoli(0, 1, 3).unwrap();
    c.toffoli(2, 3, 0).unwrap();
    c.ry(2.0 * PI / 3.0, 3).unwrap();
    c.x(3).unwrap();
    c.sdg(2).unwrap();
    c
}

#[test]
fn mixed_circuit_matches_across_2_ranks() {
    assert_states_match(&mixed_circuit(), 2);
}

#[test]
fn mixed_circuit_matches_across_4_ranks() {
    assert_states_match(&mixed_circuit(), 4);
}

#[test]
fn ghz10_matches_across_2_and_4_ranks() {
    let circuit = Circuit::ghz(10);
    assert_states_match(&circuit, 2);
    assert_states_match(&circuit, 4);
}

#[test]
fn rotation_ladder_matches_across_4_ranks() {
    let mut c = Circuit::new(6);
    for q in 0..6 {
        c.ry(0.1 + 0.2 * q as f64, q).unwrap();
    }
    for q in 0..5 {
        c.cnot(q, q + 1).unwrap();
    }
    for q in 0..6 {
        c.rz(0.05 * (q + 1) as f64, q).unwrap();
    }
    assert_states_match(&c, 4);
}

#[test]
fn measurement_agrees_with_single_process() {
    // Same seed, same lockstep draw: the collapsed state matches the CPU
    // register's, including a measurement on a global qubit.
    let mut circuit = Circuit::ghz(3);
    circuit.measure(2, 2).unwrap();

    let single = run_single(&circuit);
    let sharded = run_distributed(&circuit, 2);
    for (a, b) in single.iter().zip(sharded.iter()) {
        assert!((a - b).norm() < 1e-12);
    }
}

#[test]
fn distributed_expectation_matches_cpu() {
    let observable = Hamiltonian::from_terms(vec![
        PauliTerm::identity(0.5),
        PauliTerm::z(2, 1.0),
        PauliTerm::zz(0, 2, -0.7),
        PauliTerm::xx(1, 2, 0.3),
        PauliTerm::new(0.4, PauliString::from_word("YIZ").unwrap()),
    ]);

    let mut circuit = Circuit::new(3);
    circuit.h(0).unwrap();
    circuit.cnot(0, 1).unwrap();
    circuit.ry(0.9, 2).unwrap();
    circuit.cnot(1, 2).unwrap();

    let mut cpu = CpuRegister::with_seed(3, SEED).unwrap();
    cpu.run(&circuit).unwrap();
    let expected = cpu.expectation(&observable).unwrap();

    let endpoints = LocalCluster::connect(2).unwrap();
    let handles: Vec<_> = endpoints
        .into_iter()
        .map(|transport| {
            let circuit = circuit.clone();
            let observable = observable.clone();
            thread::spawn(move || {
                let mut reg = ShardedRegister::new(3, transport, SEED).unwrap();
                reg.run(&circuit).unwrap();
                reg.expectation(&observable).unwrap()
            })
        })
        .collect();
    for handle in handles {
        let got = handle.join().unwrap();
        assert!((got - expected).abs() < 1e-12, "{got} vs {expected}");
    }
}

#[test]
fn norm_stays_unit_across_ranks() {
    let endpoints = LocalCluster::connect(4).unwrap();
    let handles: Vec<_> = endpoints
        .into_iter()
        .map(|transport| {
            thread::spawn(move || {
                let mut reg = ShardedRegister::new(5, transport, SEED).unwrap();
                reg.run(&mixed_circuit_on(5)).unwrap();
                reg.norm_sqr().unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!((handle.join().unwrap() - 1.0).abs() < 1e-9);
    }
}

fn mixed_circuit_on(n: u32) -> Circuit {
    let mut c = Circuit::new(n);
    for q in 0..n {
        c.h(q).unwrap();
        c.t(q).unwrap();
    }
    for q in 0..n - 1 {
        c.cnot(q, q + 1).unwrap();
    }
    c.ry(0.8, n - 1).unwrap();
    c
}

#[test]
fn too_many_ranks_is_invalid() {
    let endpoints = LocalCluster::connect(4).unwrap();
    let handles: Vec<_> = endpoints
        .into_iter()
        .map(|transport| {
            thread::spawn(move || ShardedRegister::new(2, transport, SEED).err().is_some())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
