//! Bash permutation constants.
//!
//! The round constants below are the literal `C0..C23` table defined by
//! STB 34.101.77 and reproduced byte-for-byte from the reference
//! implementation; they are not derived from any formula and must not be
//! regenerated.
//!
//! The per-lane rotation amounts, by contrast, come from the recurrence
//! `f(x) = 7x mod 64` seeded at `m1=8, n1=53, m2=14, n2=1`: each of the two
//! parallel S-layer triples consumes four successive iterates of this
//! sequence (indices 0..3 for `(W0,W2,W4)`, indices 4..7 for `(W1,W3,W5)`).

/// State size in 64-bit lanes.
pub const WORDS: usize = 24;

/// State size in octets.
pub const STATE_BYTES: usize = WORDS * 8;

/// Number of rounds applied by the permutation `F`.
pub const ROUNDS: usize = 24;

/// Round constants `C0..C23`, injected into the lane numbered S23 after the
/// P-layer of each round.
pub const ROUND_CONSTANTS: [u64; ROUNDS] = [
    0x3bf5_080a_c8ba_94b1,
    0xc1d1_659c_1bbd_92f6,
    0x60e8_b2ce_0dde_c97b,
    0xec5f_b8fe_790f_bc13,
    0xaa04_3de6_4367_06a7,
    0x8929_ff6a_5e53_5bfd,
    0x98bf_1e2c_50c9_7550,
    0x4c5f_8f16_2864_baa8,
    0x262f_c78b_1432_5d54,
    0x1317_e3c5_8a19_2eaa,
    0x098b_f1e2_c50c_9755,
    0xd8ee_1968_1d66_9304,
    0x6c77_0cb4_0eb3_4982,
    0x363b_865a_0759_a4c1,
    0xc736_22b4_7c4c_0ace,
    0x639b_115a_3e26_0567,
    0xede6_6934_60f3_da1d,
    0xaad8_d503_4f99_35a0,
    0x556c_6a81_a7cc_9ad0,
    0x2ab6_3540_d3e6_4d68,
    0x155b_1aa0_69f3_26b4,
    0x0aad_8d50_34f9_935a,
    0x0556_c6a8_1a7c_c9ad,
    0xde80_82cd_72de_bc78,
];

/// Rotation amounts `m1` for the S-layer's `T = rotL(X, m1)` step, one per
/// lane across both parallel triples (first four lanes for `(W0,W2,W4)`,
/// last four for `(W1,W3,W5)`).
pub const M1: [u32; 8] = [8, 56, 8, 56, 8, 56, 8, 56];

/// Rotation amounts `n1` for `V = Y ^ rotL(U, n1)`.
pub const N1: [u32; 8] = [53, 51, 37, 3, 21, 19, 5, 35];

/// Rotation amounts `m2` for the `rotL(Z, m2)` term of `W`.
pub const M2: [u32; 8] = [14, 34, 46, 2, 14, 34, 46, 2];

/// Rotation amounts `n2` for the `rotL(V, n2)` term of `W`.
pub const N2: [u32; 8] = [1, 7, 49, 23, 33, 39, 17, 55];

/// P-layer: fixed permutation of the 24 lanes, applied after the S-layer of
/// every round. `PERMUTATION[i]` names the source lane that feeds output
/// lane `i`.
pub const PERMUTATION: [usize; WORDS] = [
    6, 3, 0, 5, 2, 7, 4, 1, //
    15, 10, 9, 12, 11, 14, 13, 8, //
    17, 16, 19, 18, 21, 20, 23, 22,
];
