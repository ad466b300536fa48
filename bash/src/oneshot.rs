//! One-shot hashing convenience wrappers over [`crate::Sponge`].

use crate::streaming::Sponge;
use crate::types::BashError;

/// Compute the bash hash of `src` at security level `l` (bits), writing
/// exactly `out.len()` octets (`out.len()` must be `<= l/4`).
///
/// # Errors
/// Returns [`BashError::BadParam`] if `l` or `out.len()` is invalid.
pub fn hash(l: usize, src: &[u8], out: &mut [u8]) -> Result<(), BashError> {
    let mut sponge = Sponge::new(l)?;
    sponge.step_h(src);
    sponge.step_g(out)
}

/// bash256: security level `l = 128`, 32-octet digest.
#[must_use]
#[allow(clippy::expect_used)]
pub fn hash256(src: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    hash(128, src, &mut out).expect("l=128, out.len()=32=l/4 are always valid");
    out
}

/// bash384: security level `l = 192`, 48-octet digest.
#[must_use]
#[allow(clippy::expect_used)]
pub fn hash384(src: &[u8]) -> [u8; 48] {
    let mut out = [0u8; 48];
    hash(192, src, &mut out).expect("l=192, out.len()=48=l/4 are always valid");
    out
}

/// bash512: security level `l = 256`, 64-octet digest.
#[must_use]
#[allow(clippy::expect_used)]
pub fn hash512(src: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    hash(256, src, &mut out).expect("l=256, out.len()=64=l/4 are always valid");
    out
}

/// Verify `src` hashes to `expected` at security level `l`, in constant
/// time.
///
/// # Errors
/// Returns [`BashError::BadParam`] if `l` or `expected.len()` is invalid.
pub fn verify(l: usize, src: &[u8], expected: &[u8]) -> Result<bool, BashError> {
    let mut sponge = Sponge::new(l)?;
    sponge.step_h(src);
    sponge.step_v(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash256_matches_manual_sponge() {
        let mut sponge = Sponge::new(128).unwrap();
        sponge.step_h(b"abc");
        let mut expected = [0u8; 32];
        sponge.step_g(&mut expected).unwrap();
        assert_eq!(hash256(b"abc"), expected);
    }

    #[test]
    fn verify_round_trips() {
        let digest = hash512(b"payload");
        assert!(verify(256, b"payload", &digest).unwrap());
        assert!(!verify(256, b"tampered", &digest).unwrap());
    }

    #[test]
    fn hash_rejects_oversized_output() {
        let mut out = [0u8; 65];
        assert_eq!(hash(256, b"x", &mut out), Err(BashError::BadParam));
    }
}
