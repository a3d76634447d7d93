//! Gate kernels over the amplitude store.
//!
//! Every single-qubit gate acts on disjoint amplitude pairs (j, j + 2^t).
//! The buffer decomposes into blocks of 2·2^t contiguous amplitudes; inside
//! a block the first half holds the "a" side (target bit 0) and the second
//! half the "b" side (target bit 1). Blocks are independent work units, so
//! the walk parallelizes with a fork-join over chunks and no locking.
//!
//! Pauli and phase kernels are free of floating-point products where the
//! result is a pure swap or negation, so they match the scalar form
//! bit-for-bit; the dense kernel vectorizes through [`crate::simd`].

use alsvid_ir::{Gate, Matrix2};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::{SimError, SimResult};
use crate::simd;

/// Buffer length at which kernels switch to the rayon fork-join walk.
pub const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Walk the pair partition for `target`, handing each block's halves to `f`
/// together with the block's base amplitude index.
#[inline]
pub fn for_each_pair_block<F>(state: &mut [Complex64], target: usize, f: F)
where
    F: Fn(usize, &mut [Complex64], &mut [Complex64]) + Sync + Send,
{
    let stride = 1usize << target;
    debug_assert!(stride < state.len(), "target {target} escapes the store");
    let block = 2 * stride;
    if state.len() >= PARALLEL_THRESHOLD {
        state
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(index, chunk)| {
                let (lo, hi) = chunk.split_at_mut(stride);
                f(index * block, lo, hi);
            });
    } else {
        for (index, chunk) in state.chunks_mut(block).enumerate() {
            let (lo, hi) = chunk.split_at_mut(stride);
            f(index * block, lo, hi);
        }
    }
}

/// Apply an arbitrary 2×2 unitary across the pair partition of `target`.
pub fn apply_dense(state: &mut [Complex64], target: usize, m: &Matrix2) {
    for_each_pair_block(state, target, |_, lo, hi| simd::apply_block(lo, hi, m));
}

/// Apply diag(d0, d1) across the pair partition of `target`.
pub fn apply_diagonal(state: &mut [Complex64], target: usize, d0: Complex64, d1: Complex64) {
    let one = Complex64::new(1.0, 0.0);
    let scale_lo = d0 != one;
    for_each_pair_block(state, target, |_, lo, hi| {
        if scale_lo {
            for a in lo.iter_mut() {
                *a *= d0;
            }
        }
        for b in hi.iter_mut() {
            *b *= d1;
        }
    });
}

/// Pauli-X: swap the pair halves. No arithmetic.
pub fn apply_x(state: &mut [Complex64], target: usize) {
    for_each_pair_block(state, target, |_, lo, hi| lo.swap_with_slice(hi));
}

/// X across `target` conditioned on every bit of `control_mask` being set.
///
/// CNOT uses a single control bit, Toffoli two; the mask must not contain
/// the target bit.
pub fn apply_controlled_x(state: &mut [Complex64], target: usize, control_mask: usize) {
    debug_assert_eq!(control_mask & (1 << target), 0);
    for_each_pair_block(state, target, |base, lo, hi| {
        for i in 0..lo.len() {
            if (base + i) & control_mask == control_mask {
                std::mem::swap(&mut lo[i], &mut hi[i]);
            }
        }
    });
}

/// CZ: negate amplitudes whose bits `a` and `b` are both 1.
pub fn apply_cz(state: &mut [Complex64], a: usize, b: usize) {
    let mask = (1usize << a) | (1usize << b);
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_iter_mut().enumerate().for_each(|(i, amp)| {
            if i & mask == mask {
                *amp = -*amp;
            }
        });
    } else {
        for (i, amp) in state.iter_mut().enumerate() {
            if i & mask == mask {
                *amp = -*amp;
            }
        }
    }
}

/// SWAP: exchange amplitudes that differ exactly in bits `a` and `b`.
pub fn apply_swap(state: &mut [Complex64], a: usize, b: usize) {
    let (p, q) = if a < b { (a, b) } else { (b, a) };
    let p_mask = 1usize << p;
    for_each_pair_block(state, q, |_, lo, hi| {
        // lo holds q = 0; the partner of lo[i] (p = 1) sits in hi with p
        // cleared.
        for i in 0..lo.len() {
            if i & p_mask != 0 {
                std::mem::swap(&mut lo[i], &mut hi[i ^ p_mask]);
            }
        }
    });
}

/// Σ |amplitude|² over indices whose `target` bit is 1.
pub fn probability_one(state: &[Complex64], target: usize) -> f64 {
    let stride = 1usize << target;
    let block = 2 * stride;
    if state.len() >= PARALLEL_THRESHOLD {
        state
            .par_chunks(block)
            .map(|chunk| chunk[stride..].iter().map(Complex64::norm_sqr).sum::<f64>())
            .sum()
    } else {
        state
            .chunks(block)
            .map(|chunk| chunk[stride..].iter().map(Complex64::norm_sqr).sum::<f64>())
            .sum()
    }
}

/// Zero the amplitudes whose `target` bit disagrees with `outcome` and
/// rescale the survivors.
pub fn collapse(state: &mut [Complex64], target: usize, outcome: bool, scale: f64) {
    let zero = Complex64::new(0.0, 0.0);
    for_each_pair_block(state, target, |_, lo, hi| {
        let (keep, drop) = if outcome { (hi, lo) } else { (lo, hi) };
        for a in keep.iter_mut() {
            *a *= scale;
        }
        for a in drop.iter_mut() {
            *a = zero;
        }
    });
}

/// Σ sign(i) · |state[i]|² where sign flips with the parity of `z_mask` bits.
pub fn z_expectation(state: &[Complex64], z_mask: usize) -> f64 {
    let signed = |(i, amp): (usize, &Complex64)| {
        let p = amp.norm_sqr();
        if ((i & z_mask).count_ones() & 1) == 1 { -p } else { p }
    };
    if state.len() >= PARALLEL_THRESHOLD {
        state.par_iter().enumerate().map(signed).sum()
    } else {
        state.iter().enumerate().map(signed).sum()
    }
}

/// ⟨a|b⟩ = Σ conj(a_i) · b_i over the local buffers.
pub fn inner_product(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    debug_assert_eq!(a.len(), b.len());
    if a.len() >= PARALLEL_THRESHOLD {
        a.par_iter().zip(b.par_iter()).map(|(x, y)| x.conj() * y).sum()
    } else {
        a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
    }
}

/// Apply a validated unitary gate whose operands are all local.
///
/// Measurement is not a unitary and must be dispatched by the register.
pub fn apply_unitary(state: &mut [Complex64], gate: &Gate) -> SimResult<()> {
    match *gate {
        Gate::H { target } => apply_dense(state, target as usize, &Matrix2::h()),
        Gate::X { target } => apply_x(state, target as usize),
        Gate::Y { target } => apply_dense(state, target as usize, &Matrix2::y()),
        Gate::Z { target } => {
            apply_diagonal(
                state,
                target as usize,
                Complex64::new(1.0, 0.0),
                Complex64::new(-1.0, 0.0),
            );
        }
        // Diagonal single-qubit gates skip the dense pair update.
        Gate::S { target } => {
            let one = Complex64::new(1.0, 0.0);
            apply_diagonal(state, target as usize, one, Complex64::new(0.0, 1.0));
        }
        Gate::Sdg { target } => {
            let one = Complex64::new(1.0, 0.0);
            apply_diagonal(state, target as usize, one, Complex64::new(0.0, -1.0));
        }
        Gate::T { target } => {
            let one = Complex64::new(1.0, 0.0);
            let d1 = Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4);
            apply_diagonal(state, target as usize, one, d1);
        }
        Gate::Tdg { target } => {
            let one = Complex64::new(1.0, 0.0);
            let d1 = Complex64::from_polar(1.0, -std::f64::consts::FRAC_PI_4);
            apply_diagonal(state, target as usize, one, d1);
        }
        Gate::Rz { target, theta } => {
            apply_diagonal(
                state,
                target as usize,
                Complex64::from_polar(1.0, -theta / 2.0),
                Complex64::from_polar(1.0, theta / 2.0),
            );
        }
        Gate::Phase { target, phi } => {
            let one = Complex64::new(1.0, 0.0);
            apply_diagonal(state, target as usize, one, Complex64::from_polar(1.0, phi));
        }
        Gate::Rx { target, theta } => apply_dense(state, target as usize, &Matrix2::rx(theta)),
        Gate::Ry { target, theta } => apply_dense(state, target as usize, &Matrix2::ry(theta)),
        Gate::Fused { target, matrix } => {
            if matrix.is_diagonal() {
                apply_diagonal(state, target as usize, matrix.data[0], matrix.data[3]);
            } else {
                apply_dense(state, target as usize, &matrix);
            }
        }
        Gate::Cnot { control, target } => {
            apply_controlled_x(state, target as usize, 1usize << control);
        }
        Gate::Cz { control, target } => apply_cz(state, control as usize, target as usize),
        Gate::Swap { a, b } => apply_swap(state, a as usize, b as usize),
        Gate::Toffoli { controls, target } => {
            let mask = (1usize << controls[0]) | (1usize << controls[1]);
            apply_controlled_x(state, target as usize, mask);
        }
        Gate::Measure { .. } => {
            return Err(SimError::InvalidArgument(
                "measurement cannot be applied as a unitary kernel".into(),
            ));
        }
    }
    Ok(())
}

/// Combine exchanged halves of a pair split across two ranks.
///
/// After a full buffer swap, the rank owning the "a" side computes
/// a′ = m00·a + m01·b and the "b" side computes b′ = m10·a + m11·b, each
/// writing only its own half of the output.
pub fn combine_exchanged(
    own: &mut [Complex64],
    partner: &[Complex64],
    m: &Matrix2,
    own_side_is_one: bool,
) {
    let [m00, m01, m10, m11] = m.data;
    // On the bit-1 side the partner holds "a" and we hold "b".
    let (own_coeff, partner_coeff) = if own_side_is_one { (m11, m10) } else { (m00, m01) };
    if own.len() >= PARALLEL_THRESHOLD {
        own.par_iter_mut()
            .zip(partner.par_iter())
            .for_each(|(o, p)| *o = own_coeff * *o + partner_coeff * *p);
    } else {
        for (o, p) in own.iter_mut().zip(partner.iter()) {
            *o = own_coeff * *o + partner_coeff * *p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground(n: usize) -> Vec<Complex64> {
        let mut v = vec![Complex64::new(0.0, 0.0); 1 << n];
        v[0] = Complex64::new(1.0, 0.0);
        v
    }

    #[test]
    fn x_moves_ground_to_flipped_index() {
        let mut state = ground(3);
        apply_x(&mut state, 1);
        assert_eq!(state[0], Complex64::new(0.0, 0.0));
        assert_eq!(state[2], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn hadamard_splits_ground() {
        let mut state = ground(1);
        apply_dense(&mut state, 0, &Matrix2::h());
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert!((state[0].re - s).abs() < 1e-15);
        assert!((state[1].re - s).abs() < 1e-15);
    }

    #[test]
    fn controlled_x_respects_control() {
        let mut state = ground(2);
        // Control bit 0 is 0 in the ground state: no action.
        apply_controlled_x(&mut state, 1, 0b01);
        assert_eq!(state[0], Complex64::new(1.0, 0.0));

        // Flip the control, then CNOT fires.
        apply_x(&mut state, 0);
        apply_controlled_x(&mut state, 1, 0b01);
        assert_eq!(state[0b11], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn swap_exchanges_single_excitation() {
        let mut state = ground(3);
        apply_x(&mut state, 0); // |001⟩
        apply_swap(&mut state, 0, 2);
        assert_eq!(state[0b100], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn cz_negates_the_11_component() {
        let mut state = ground(2);
        apply_x(&mut state, 0);
        apply_x(&mut state, 1);
        apply_cz(&mut state, 0, 1);
        assert_eq!(state[0b11], Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn probability_and_collapse() {
        let mut state = ground(1);
        apply_dense(&mut state, 0, &Matrix2::h());
        let p1 = probability_one(&state, 0);
        assert!((p1 - 0.5).abs() < 1e-12);

        collapse(&mut state, 0, true, 1.0 / p1.sqrt());
        assert_eq!(state[0], Complex64::new(0.0, 0.0));
        assert!((state[1].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn z_expectation_signs() {
        let state = ground(2);
        assert!((z_expectation(&state, 0b01) - 1.0).abs() < 1e-15);

        let mut flipped = ground(2);
        apply_x(&mut flipped, 0);
        assert!((z_expectation(&flipped, 0b01) + 1.0).abs() < 1e-15);
        // Z on the untouched qubit still sees +1.
        assert!((z_expectation(&flipped, 0b10) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn combine_exchanged_matches_local_gate() {
        // One qubit split across two "ranks" of one amplitude each.
        let m = Matrix2::h();
        let a = Complex64::new(0.6, 0.1);
        let b = Complex64::new(0.3, -0.4);

        let mut rank0 = vec![a];
        let mut rank1 = vec![b];
        combine_exchanged(&mut rank0, &[b], &m, false);
        combine_exchanged(&mut rank1, &[a], &m, true);

        let mut local = vec![a, b];
        apply_dense(&mut local, 0, &m);
        assert!((rank0[0] - local[0]).norm() < 1e-15);
        assert!((rank1[0] - local[1]).norm() < 1e-15);
    }
}
