//! The pre-pass must not change circuit semantics: optimized and
//! unoptimized pipelines produce the same state up to global phase.

use alsvid_compile::{OptLevel, PrePass};
use alsvid_engine::{CpuRegister, Register};
use alsvid_ir::{Circuit, Gate};
use num_complex::Complex64;
use proptest::prelude::*;
use std::f64::consts::PI;

fn final_state(circuit: &Circuit) -> Vec<Complex64> {
    let mut reg = CpuRegister::with_seed(circuit.num_qubits(), 3).unwrap();
    reg.run(circuit).unwrap();
    reg.local_amplitudes().to_vec()
}

/// Index of the largest-magnitude amplitude.
fn pivot_index(state: &[Complex64]) -> usize {
    state
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Rotate a state so the amplitude at `pivot` is real positive, removing
/// the global phase. Both states under comparison must use the same pivot.
fn fix_phase_at(mut state: Vec<Complex64>, pivot: usize) -> Vec<Complex64> {
    let anchor = state[pivot];
    if anchor.norm() > 1e-12 {
        let phase = anchor.conj() / anchor.norm();
        for amp in &mut state {
            *amp *= phase;
        }
    }
    state
}

fn assert_equivalent(circuit: &Circuit, level: OptLevel) {
    let reference = final_state(circuit);
    let pivot = pivot_index(&reference);
    let reference = fix_phase_at(reference, pivot);

    let optimized_circuit = PrePass::with_level(level).run(circuit).unwrap();
    let optimized = fix_phase_at(final_state(&optimized_circuit), pivot);

    for (i, (a, b)) in reference.iter().zip(optimized.iter()).enumerate() {
        assert!(
            (a - b).norm() < 1e-10,
            "amplitude {i} diverges at {level:?}: {a} vs {b}"
        );
    }
}

#[test]
fn o1_preserves_a_cancellation_heavy_circuit() {
    let mut c = Circuit::new(3);
    c.x(0).unwrap().x(0).unwrap();
    c.h(1).unwrap();
    c.cnot(1, 2).unwrap();
    c.cnot(1, 2).unwrap();
    c.rz(0.9, 1).unwrap();
    c.rz(-0.9, 1).unwrap();
    c.t(2).unwrap();
    assert_equivalent(&c, OptLevel::O1);

    let optimized = PrePass::with_level(OptLevel::O1).run(&c).unwrap();
    assert_eq!(optimized.len(), 2); // H and T survive
}

#[test]
fn o2_preserves_fused_runs() {
    let mut c = Circuit::new(2);
    c.h(0).unwrap().t(0).unwrap().s(0).unwrap();
    c.ry(0.4, 1).unwrap().rz(1.1, 1).unwrap();
    c.cnot(0, 1).unwrap();
    c.h(1).unwrap().h(0).unwrap();
    assert_equivalent(&c, OptLevel::O2);
}

#[test]
fn o3_widens_fusion_windows() {
    let mut c = Circuit::new(2);
    c.rz(0.3, 0).unwrap();
    c.cz(0, 1).unwrap();
    c.rz(0.5, 0).unwrap();
    c.h(1).unwrap();
    assert_equivalent(&c, OptLevel::O3);

    // O3 merges the two RZ across the commuting CZ; O2 cannot.
    let o2 = PrePass::with_level(OptLevel::O2).run(&c).unwrap();
    let o3 = PrePass::with_level(OptLevel::O3).run(&c).unwrap();
    assert!(o3.len() < o2.len(), "O3 ({}) not shorter than O2 ({})", o3.len(), o2.len());
}

#[test]
fn full_turn_rotations_vanish_up_to_phase() {
    let mut c = Circuit::new(1);
    for _ in 0..6 {
        c.ry(PI / 3.0, 0).unwrap();
    }
    // RY(2π) = −I: a pure global phase, removable by fusion.
    let optimized = PrePass::with_level(OptLevel::O2).run(&c).unwrap();
    assert!(optimized.is_empty());
    assert_equivalent(&c, OptLevel::O2);
}

fn gate_strategy(n: u32) -> impl Strategy<Value = Gate> {
    let q = 0..n;
    let theta = -PI..PI;
    prop_oneof![
        q.clone().prop_map(|target| Gate::H { target }),
        q.clone().prop_map(|target| Gate::X { target }),
        q.clone().prop_map(|target| Gate::S { target }),
        q.clone().prop_map(|target| Gate::Tdg { target }),
        (q.clone(), theta.clone()).prop_map(|(target, theta)| Gate::Rx { target, theta }),
        (q.clone(), theta.clone()).prop_map(|(target, theta)| Gate::Ry { target, theta }),
        (q.clone(), theta).prop_map(|(target, theta)| Gate::Rz { target, theta }),
        (q.clone(), q.clone()).prop_filter_map("control = target", |(c, t)| {
            (c != t).then_some(Gate::Cnot { control: c, target: t })
        }),
        (q.clone(), q).prop_filter_map("control = target", |(c, t)| {
            (c != t).then_some(Gate::Cz { control: c, target: t })
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every level preserves the semantics of arbitrary circuits.
    #[test]
    fn all_levels_preserve_random_circuits(
        ops in prop::collection::vec(gate_strategy(3), 0..24)
    ) {
        let circuit = Circuit::from_ops(3, ops).unwrap();
        for level in [OptLevel::O1, OptLevel::O2, OptLevel::O3] {
            let reference = final_state(&circuit);
            let pivot = pivot_index(&reference);
            let reference = fix_phase_at(reference, pivot);

            let optimized_circuit = PrePass::with_level(level).run(&circuit).unwrap();
            let optimized = fix_phase_at(final_state(&optimized_circuit), pivot);
            for (a, b) in reference.iter().zip(optimized.iter()) {
                prop_assert!((a - b).norm() < 1e-10);
            }
        }
    }
}
