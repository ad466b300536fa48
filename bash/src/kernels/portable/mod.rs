//! Portable (scalar) implementation of the bash permutation `F`.
//!
//! Operates on plain `u64` lanes so it compiles and runs identically on any
//! target. [`super::vector`] must produce bit-identical output for every
//! input; this module is the reference the vector kernel is checked
//! against.

use super::constants::{M1, M2, N1, N2, PERMUTATION, ROUNDS, ROUND_CONSTANTS, WORDS};

/// S-layer step applied to one lane of a parallel triple `(x, y, z)`.
///
/// Matches the formulas of the bash specification exactly:
/// `T = rotL(x,m1)`, `U = x^y^z`, `V = y^rotL(U,n1)`,
/// `W = (z^rotL(z,m2)) ^ rotL(V,n2)`, with outputs
/// `Y' = V ^ (U|W)`, `Z' = W ^ (!W | (V^T))`, `X' = U ^ ((V^T) & W)`.
#[inline]
#[must_use]
fn bash_s(x: u64, y: u64, z: u64, m1: u32, n1: u32, m2: u32, n2: u32) -> (u64, u64, u64) {
    let t = x.rotate_left(m1);
    let u = x ^ y ^ z;
    let v = y ^ u.rotate_left(n1);
    let w = (z ^ z.rotate_left(m2)) ^ v.rotate_left(n2);
    let y_out = v ^ (u | w);
    let z_out = w ^ (!w | (v ^ t));
    let x_out = u ^ ((v ^ t) & w);
    (x_out, y_out, z_out)
}

/// Apply the S-layer to both parallel triples `(W0,W2,W4)` and
/// `(W1,W3,W5)`.
#[inline]
fn s_layer(s: &mut [u64; WORDS]) {
    for k in 0..4 {
        let (x, y, z) = bash_s(s[k], s[8 + k], s[16 + k], M1[k], N1[k], M2[k], N2[k]);
        s[k] = x;
        s[8 + k] = y;
        s[16 + k] = z;
    }
    for k in 0..4 {
        let (x, y, z) = bash_s(
            s[4 + k],
            s[12 + k],
            s[20 + k],
            M1[4 + k],
            N1[4 + k],
            M2[4 + k],
            N2[4 + k],
        );
        s[4 + k] = x;
        s[12 + k] = y;
        s[20 + k] = z;
    }
}

/// Apply the fixed 24-lane P-layer.
#[inline]
fn p_layer(s: &mut [u64; WORDS]) {
    let src = *s;
    for (i, &from) in PERMUTATION.iter().enumerate() {
        s[i] = src[from];
    }
}

/// One full round: S-layer, P-layer, round-constant injection into lane 23.
#[inline]
fn round(s: &mut [u64; WORDS], constant: u64) {
    s_layer(s);
    p_layer(s);
    s[23] ^= constant;
}

/// Apply the 24-round bash permutation `F` to a 24-lane state in place.
///
/// Constant-time with respect to the input: every round visits the same
/// lanes in the same order regardless of their values.
pub fn permute(state: &mut [u64; WORDS]) {
    for &constant in ROUND_CONSTANTS.iter().take(ROUNDS) {
        round(state, constant);
    }
}

/// Apply `F` to a 192-octet state buffer of little-endian 64-bit lanes.
pub fn permute_bytes(block: &mut [u8; super::constants::STATE_BYTES]) {
    let mut lanes = [0u64; WORDS];
    for (lane, chunk) in lanes.iter_mut().zip(block.chunks_exact(8)) {
        *lane = u64::from_le_bytes(chunk.try_into().unwrap_or([0; 8]));
    }
    permute(&mut lanes);
    for (lane, chunk) in lanes.iter().zip(block.chunks_exact_mut(8)) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
}
