//! Consistency & Regression Tests
//!
//! Verifies internal logic consistency and boundary conditions:
//! - Streaming vs one-shot consistency across sizes
//! - Backend determinism (portable vs avx2, when both are available)
//! - Output-length boundary checks

use bash::{hash256, hash512, BackendKind, Sponge};

fn hash_with(kind: BackendKind, l: usize, data: &[u8], out: &mut [u8]) {
    let mut sponge = Sponge::new_with_backend(l, kind).unwrap();
    sponge.step_h(data);
    sponge.step_g(out).unwrap();
}

#[test]
fn portable_backend_matches_across_repeated_runs() {
    let scenarios: Vec<Vec<u8>> = vec![
        vec![],
        b"x".to_vec(),
        vec![0u8; 64],
        vec![1u8; 192],
        vec![2u8; 193],
        vec![3u8; 1000],
    ];

    for input in scenarios {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        hash_with(BackendKind::Portable, 256, &input, &mut a);
        hash_with(BackendKind::Portable, 256, &input, &mut b);
        assert_eq!(a, b, "portable backend not deterministic for len={}", input.len());
    }
}

#[test]
fn portable_and_avx2_agree_when_avx2_is_available() {
    if !is_x86_feature_detected() {
        return;
    }

    let scenarios: Vec<Vec<u8>> = vec![
        vec![],
        b"Tachyon".to_vec(),
        vec![0u8; 64],
        vec![1u8; 192],
        vec![2u8; 193],
        vec![0xAAu8; 4096],
    ];

    for input in scenarios {
        let mut portable = [0u8; 64];
        let mut avx2 = [0u8; 64];
        hash_with(BackendKind::Portable, 256, &input, &mut portable);
        hash_with(BackendKind::Avx2, 256, &input, &mut avx2);
        assert_eq!(
            portable,
            avx2,
            "portable/avx2 mismatch for len={}",
            input.len()
        );
    }
}

#[cfg(all(target_arch = "x86_64", feature = "std"))]
fn is_x86_feature_detected() -> bool {
    std::is_x86_feature_detected!("avx2")
}

#[cfg(not(all(target_arch = "x86_64", feature = "std")))]
fn is_x86_feature_detected() -> bool {
    false
}

#[test]
fn streaming_and_oneshot_agree_across_sizes() {
    for len in [0usize, 1, 16, 191, 192, 193, 384, 1000, 8192] {
        let input = vec![(len % 256) as u8; len];

        let mut sponge = Sponge::new(256).unwrap();
        sponge.step_h(&input);
        let mut streamed = [0u8; 64];
        sponge.step_g(&mut streamed).unwrap();

        assert_eq!(streamed, hash512(&input), "mismatch at len={len}");
    }
}

#[test]
fn single_bit_flip_changes_the_digest() {
    let base = hash256(b"consistency check message");
    for byte_index in 0..4usize {
        let mut mutated = b"consistency check message".to_vec();
        mutated[byte_index] ^= 0x01;
        assert_ne!(hash256(&mutated), base, "no avalanche at byte {byte_index}");
    }
}

#[test]
fn output_length_exactly_at_boundary_is_accepted() {
    // l=128 -> l/4 = 32 octets is the maximum permitted digest length.
    let mut sponge = Sponge::new(128).unwrap();
    let mut out = [0u8; 32];
    assert!(sponge.step_g(&mut out).is_ok());
}

#[test]
fn output_length_one_past_boundary_is_rejected() {
    let mut sponge = Sponge::new(128).unwrap();
    let mut out = [0u8; 33];
    assert!(sponge.step_g(&mut out).is_err());
}
