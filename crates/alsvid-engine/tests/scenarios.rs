//! End-to-end register scenarios: canonical entangled states, identities,
//! measurement statistics and collapse behavior.

use alsvid_engine::{CpuRegister, Register, SimError};
use alsvid_ir::{Circuit, Gate};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

#[test]
fn bell_pair_state_and_correlated_measurements() {
    let mut reg = CpuRegister::with_seed(2, 5).unwrap();
    reg.run(&Circuit::bell()).unwrap();

    let amps = reg.local_amplitudes();
    assert!((amps[0b00].re - FRAC_1_SQRT_2).abs() < 1e-12);
    assert!((amps[0b11].re - FRAC_1_SQRT_2).abs() < 1e-12);
    assert!(amps[0b01].norm() < 1e-12);
    assert!(amps[0b10].norm() < 1e-12);

    // Both qubits always agree, whichever branch the first collapse picks.
    for seed in 0..32 {
        let mut reg = CpuRegister::with_seed(2, seed).unwrap();
        reg.run(&Circuit::bell()).unwrap();
        let first = reg.measure(0).unwrap();
        let second = reg.measure(1).unwrap();
        assert_eq!(first, second, "Bell measurements disagree at seed {seed}");
    }
}

#[test]
fn ghz3_state() {
    let mut reg = CpuRegister::with_seed(3, 5).unwrap();
    reg.run(&Circuit::ghz(3)).unwrap();

    let amps = reg.local_amplitudes();
    assert!((amps[0b000].re - FRAC_1_SQRT_2).abs() < 1e-12);
    assert!((amps[0b111].re - FRAC_1_SQRT_2).abs() < 1e-12);
    for i in 1..7 {
        assert!(amps[i].norm() < 1e-12, "residual amplitude at index {i}");
    }
}

#[test]
fn double_x_is_identity() {
    let mut reg = CpuRegister::with_seed(1, 5).unwrap();
    reg.apply(Gate::X { target: 0 }).unwrap();
    reg.apply(Gate::X { target: 0 }).unwrap();

    let amps = reg.local_amplitudes();
    assert!((amps[0].re - 1.0).abs() < 1e-12);
    assert!(amps[1].norm() < 1e-12);
}

#[test]
fn six_third_turns_accumulate_to_identity() {
    // RY(π/3) six times = RY(2π) = identity up to global phase.
    let mut reg = CpuRegister::with_seed(1, 5).unwrap();
    for _ in 0..6 {
        reg.apply(Gate::Ry { target: 0, theta: PI / 3.0 }).unwrap();
    }
    let amps = reg.local_amplitudes();
    assert!((amps[0].norm() - 1.0).abs() < 1e-10);
    assert!(amps[1].norm() < 1e-10);
}

#[test]
fn measurement_statistics_on_plus_state() {
    // 10 000 independent draws from H|0⟩: the frequency of outcome 1 lands
    // in [0.48, 0.52] at this sample size.
    let mut reg = CpuRegister::with_seed(1, 99).unwrap();
    let mut ones = 0usize;
    let draws = 10_000;
    for _ in 0..draws {
        reg.reset();
        reg.apply(Gate::H { target: 0 }).unwrap();
        if reg.measure(0).unwrap() {
            ones += 1;
        }
    }
    let freq = ones as f64 / draws as f64;
    assert!((0.48..=0.52).contains(&freq), "frequency {freq} out of band");
}

#[test]
fn repeated_measurement_is_stable() {
    for seed in 0..16 {
        let mut reg = CpuRegister::with_seed(1, seed).unwrap();
        reg.apply(Gate::H { target: 0 }).unwrap();
        let first = reg.measure(0).unwrap();
        for _ in 0..4 {
            assert_eq!(reg.measure(0).unwrap(), first);
        }
    }
}

#[test]
fn collapse_leaves_a_pure_basis_state() {
    for seed in 0..16 {
        let mut reg = CpuRegister::with_seed(1, seed).unwrap();
        reg.apply(Gate::H { target: 0 }).unwrap();
        let outcome = reg.measure(0).unwrap();

        let amps = reg.local_amplitudes();
        let (kept, zeroed) = if outcome { (1, 0) } else { (0, 1) };
        assert_eq!(amps[zeroed].norm(), 0.0, "residual superposition survived");
        assert!((amps[kept].norm() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn measuring_an_impossible_branch_never_happens() {
    // |1⟩ measured 0 would be degenerate; the RNG can only draw outcome 1.
    let mut reg = CpuRegister::with_seed(1, 5).unwrap();
    reg.apply(Gate::X { target: 0 }).unwrap();
    assert!(reg.measure(0).unwrap());
}

#[test]
fn invalid_circuit_inputs_surface_as_invalid_argument() {
    let mut reg = CpuRegister::with_seed(2, 5).unwrap();
    assert!(matches!(
        reg.apply(Gate::H { target: 2 }),
        Err(SimError::InvalidArgument(_))
    ));
    assert!(matches!(
        reg.apply(Gate::Cnot { control: 0, target: 0 }),
        Err(SimError::InvalidArgument(_))
    ));

    let wide = Circuit::ghz(3);
    assert!(matches!(reg.run(&wide), Err(SimError::InvalidArgument(_))));
}

#[test]
fn norm_stays_unit_through_a_deep_circuit() {
    let mut reg = CpuRegister::with_seed(6, 5).unwrap();
    let mut circuit = Circuit::new(6);
    for layer in 0..10 {
        for q in 0..6 {
            circuit.ry(0.3 * (layer as f64 + 1.0), q).unwrap();
            circuit.t(q).unwrap();
        }
        for q in 0..5 {
            circuit.cnot(q, q + 1).unwrap();
        }
    }
    reg.run(&circuit).unwrap();
    assert!((reg.norm_sqr().unwrap() - 1.0).abs() < 1e-9);
}
