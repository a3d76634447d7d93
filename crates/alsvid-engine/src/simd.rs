//! SIMD path for the dense 2×2 kernel.
//!
//! On x86_64 with AVX2+FMA the pair-walk halves are processed two complex
//! amplitudes per iteration (K = 2 double-precision lanes of complex
//! values), with a scalar tail. Everywhere else the scalar form runs.
//! Capability detection happens once per process.

use alsvid_ir::Matrix2;
use num_complex::Complex64;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
#[cfg(target_arch = "x86_64")]
use std::sync::OnceLock;

/// True if the AVX2+FMA kernel may be used on this host.
#[inline]
pub fn avx2_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        static AVAILABLE: OnceLock<bool> = OnceLock::new();
        *AVAILABLE.get_or_init(|| {
            is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
        })
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Apply the 2×2 matrix to one pair block: (lo[i], hi[i]) ↦ (a′, b′).
///
/// Dispatches to the vector kernel when the halves are long enough for a
/// double-pair load; the stride-1 case always takes the scalar form.
#[inline]
pub fn apply_block(lo: &mut [Complex64], hi: &mut [Complex64], m: &Matrix2) {
    debug_assert_eq!(lo.len(), hi.len());
    #[cfg(target_arch = "x86_64")]
    if lo.len() >= 2 && avx2_available() {
        // Safety: feature presence checked above.
        unsafe { apply_block_avx2(lo, hi, m) };
        return;
    }
    apply_block_scalar(lo, hi, m);
}

/// Scalar reference form of the pair update.
pub fn apply_block_scalar(lo: &mut [Complex64], hi: &mut [Complex64], m: &Matrix2) {
    let [m00, m01, m10, m11] = m.data;
    for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
        let (x, y) = (*a, *b);
        *a = m00 * x + m01 * y;
        *b = m10 * x + m11 * y;
    }
}

/// Multiply two interleaved complex values by a broadcast scalar:
/// even lanes hold re, odd lanes im; fmaddsub subtracts in even lanes
/// and adds in odd lanes, which is exactly the complex product.
#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn cmul(z: __m256d, wre: __m256d, wim: __m256d) -> __m256d {
    unsafe {
        let swapped = _mm256_permute_pd(z, 0b0101);
        _mm256_fmaddsub_pd(z, wre, _mm256_mul_pd(swapped, wim))
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn apply_block_avx2(lo: &mut [Complex64], hi: &mut [Complex64], m: &Matrix2) {
    let [m00, m01, m10, m11] = m.data;

    unsafe {
        // One broadcast register per matrix-element component.
        let m00re = _mm256_set1_pd(m00.re);
        let m00im = _mm256_set1_pd(m00.im);
        let m01re = _mm256_set1_pd(m01.re);
        let m01im = _mm256_set1_pd(m01.im);
        let m10re = _mm256_set1_pd(m10.re);
        let m10im = _mm256_set1_pd(m10.im);
        let m11re = _mm256_set1_pd(m11.re);
        let m11im = _mm256_set1_pd(m11.im);

        let n = lo.len();
        let chunks = n / 2;
        let lo_ptr = lo.as_mut_ptr().cast::<f64>();
        let hi_ptr = hi.as_mut_ptr().cast::<f64>();

        for c in 0..chunks {
            let off = 4 * c;
            let a = _mm256_loadu_pd(lo_ptr.add(off));
            let b = _mm256_loadu_pd(hi_ptr.add(off));

            let new_a = _mm256_add_pd(cmul(a, m00re, m00im), cmul(b, m01re, m01im));
            let new_b = _mm256_add_pd(cmul(a, m10re, m10im), cmul(b, m11re, m11im));

            _mm256_storeu_pd(lo_ptr.add(off), new_a);
            _mm256_storeu_pd(hi_ptr.add(off), new_b);
        }
    }

    let n = lo.len();
    if n % 2 != 0 {
        apply_block_scalar(&mut lo[n - 1..], &mut hi[n - 1..], m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn random_halves(n: usize, seed: u64) -> (Vec<Complex64>, Vec<Complex64>) {
        // Cheap deterministic fill; statistical quality does not matter here.
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        };
        let lo = (0..n).map(|_| Complex64::new(next(), next())).collect();
        let hi = (0..n).map(|_| Complex64::new(next(), next())).collect();
        (lo, hi)
    }

    #[test]
    fn vector_path_matches_scalar_within_ulps() {
        for n in [1usize, 2, 3, 8, 17] {
            for m in [Matrix2::h(), Matrix2::rx(0.37), Matrix2::ry(2.0 * PI / 3.0)] {
                let (lo0, hi0) = random_halves(n, 42 + n as u64);
                let (mut lo_a, mut hi_a) = (lo0.clone(), hi0.clone());
                let (mut lo_b, mut hi_b) = (lo0, hi0);

                apply_block(&mut lo_a, &mut hi_a, &m);
                apply_block_scalar(&mut lo_b, &mut hi_b, &m);

                for (x, y) in lo_a.iter().zip(lo_b.iter()).chain(hi_a.iter().zip(hi_b.iter())) {
                    assert!((x - y).norm() < 1e-14, "vector/scalar divergence: {x} vs {y}");
                }
            }
        }
    }
}
