//! 256-bit-vector implementation of the bash permutation `F`.
//!
//! Packs the 24-lane state as six `__m256i` registers `W0..W5` of four
//! 64-bit lanes each, and drives the S-layer with variable-shift AVX2
//! intrinsics rather than per-lane scalar rotates. Must be bit-identical to
//! [`super::portable`] for every input — [`super::portable`] is what
//! cross-backend consistency tests check it against.
//!
//! The P-layer crosses register boundaries in a pattern that does not
//! reduce to a single `_mm256_permute4x64_epi64`/`_mm256_permute2x128_si256`
//! pair without per-register special-casing, so it is applied by spilling
//! the six registers to a stack array, permuting with the same fixed
//! (input-independent) index table the portable kernel uses, and
//! reloading. The indices are compile-time constants, not data-dependent,
//! so this remains constant-time.

#![allow(unsafe_code)]

use super::constants::{M1, M2, N1, N2, PERMUTATION, ROUNDS, ROUND_CONSTANTS, WORDS};
use core::arch::x86_64::*;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rotl(v: __m256i, amounts: [u32; 4]) -> __m256i {
    let left = _mm256_set_epi64x(
        i64::from(amounts[3]),
        i64::from(amounts[2]),
        i64::from(amounts[1]),
        i64::from(amounts[0]),
    );
    let right = _mm256_set_epi64x(
        i64::from(64 - amounts[3]),
        i64::from(64 - amounts[2]),
        i64::from(64 - amounts[1]),
        i64::from(64 - amounts[0]),
    );
    _mm256_or_si256(
        _mm256_sllv_epi64(v, left),
        _mm256_srlv_epi64(v, right),
    )
}

/// S-layer on one parallel triple of 4-lane registers, per the same
/// formulas as [`super::portable::bash_s`] but carried out lane-wise across
/// a whole `__m256i` at once.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn s_layer_triple(
    x: __m256i,
    y: __m256i,
    z: __m256i,
    m1: [u32; 4],
    n1: [u32; 4],
    m2: [u32; 4],
    n2: [u32; 4],
) -> (__m256i, __m256i, __m256i) {
    let t = rotl(x, m1);
    let u = _mm256_xor_si256(_mm256_xor_si256(x, y), z);
    let v = _mm256_xor_si256(y, rotl(u, n1));
    let w = _mm256_xor_si256(_mm256_xor_si256(z, rotl(z, m2)), rotl(v, n2));
    let vt = _mm256_xor_si256(v, t);
    let y_out = _mm256_xor_si256(v, _mm256_or_si256(u, w));
    let not_w = _mm256_xor_si256(w, _mm256_set1_epi64x(-1));
    let z_out = _mm256_xor_si256(w, _mm256_or_si256(not_w, vt));
    let x_out = _mm256_xor_si256(u, _mm256_and_si256(vt, w));
    (x_out, y_out, z_out)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn first4(a: [u32; 8]) -> [u32; 4] {
    [a[0], a[1], a[2], a[3]]
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn last4(a: [u32; 8]) -> [u32; 4] {
    [a[4], a[5], a[6], a[7]]
}

/// Apply the 24-round bash permutation `F` to a 24-lane state in place
/// using AVX2 intrinsics.
///
/// # Safety
/// Caller must ensure the `avx2` target feature is available (e.g. via
/// `is_x86_feature_detected!("avx2")` before calling).
#[target_feature(enable = "avx2")]
pub unsafe fn permute(state: &mut [u64; WORDS]) {
    let mut w0 = _mm256_loadu_si256(state[0..4].as_ptr().cast());
    let mut w1 = _mm256_loadu_si256(state[4..8].as_ptr().cast());
    let mut w2 = _mm256_loadu_si256(state[8..12].as_ptr().cast());
    let mut w3 = _mm256_loadu_si256(state[12..16].as_ptr().cast());
    let mut w4 = _mm256_loadu_si256(state[16..20].as_ptr().cast());
    let mut w5 = _mm256_loadu_si256(state[20..24].as_ptr().cast());

    for &constant in ROUND_CONSTANTS.iter().take(ROUNDS) {
        let (nx, ny, nz) = s_layer_triple(
            w0,
            w2,
            w4,
            first4(M1),
            first4(N1),
            first4(M2),
            first4(N2),
        );
        w0 = nx;
        w2 = ny;
        w4 = nz;

        let (nx, ny, nz) = s_layer_triple(w1, w3, w5, last4(M1), last4(N1), last4(M2), last4(N2));
        w1 = nx;
        w3 = ny;
        w5 = nz;

        _mm256_storeu_si256((state[0..4].as_mut_ptr()).cast(), w0);
        _mm256_storeu_si256((state[4..8].as_mut_ptr()).cast(), w1);
        _mm256_storeu_si256((state[8..12].as_mut_ptr()).cast(), w2);
        _mm256_storeu_si256((state[12..16].as_mut_ptr()).cast(), w3);
        _mm256_storeu_si256((state[16..20].as_mut_ptr()).cast(), w4);
        _mm256_storeu_si256((state[20..24].as_mut_ptr()).cast(), w5);

        let src = *state;
        for (i, &from) in PERMUTATION.iter().enumerate() {
            state[i] = src[from];
        }
        state[23] ^= constant;

        w0 = _mm256_loadu_si256(state[0..4].as_ptr().cast());
        w1 = _mm256_loadu_si256(state[4..8].as_ptr().cast());
        w2 = _mm256_loadu_si256(state[8..12].as_ptr().cast());
        w3 = _mm256_loadu_si256(state[12..16].as_ptr().cast());
        w4 = _mm256_loadu_si256(state[16..20].as_ptr().cast());
        w5 = _mm256_loadu_si256(state[20..24].as_ptr().cast());
    }
}

/// Apply `F` to a 192-octet state buffer of little-endian 64-bit lanes
/// using the AVX2 kernel.
///
/// # Safety
/// Caller must ensure the `avx2` target feature is available.
#[target_feature(enable = "avx2")]
pub unsafe fn permute_bytes(block: &mut [u8; super::constants::STATE_BYTES]) {
    let mut lanes = [0u64; WORDS];
    for (lane, chunk) in lanes.iter_mut().zip(block.chunks_exact(8)) {
        *lane = u64::from_le_bytes(chunk.try_into().unwrap_or([0; 8]));
    }
    permute(&mut lanes);
    for (lane, chunk) in lanes.iter().zip(block.chunks_exact_mut(8)) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
}
