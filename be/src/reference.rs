//! A bash-sponge-backed stand-in for the external cipher suite.
//!
//! STB 34.101.31 ("belt") is out of scope for this core (see the crate's
//! top-level documentation): the types in [`crate::cipher`] are the real
//! boundary. This module exists so the broadcast-encryption logic can be
//! exercised and tested without a real belt implementation on hand. It
//! builds a small keyed Feistel permutation on top of [`bash::Sponge`] and
//! uses it for ECB, a CBC-MAC, key replication, and a CTR-plus-MAC data
//! wrap. None of this is a standards-track cipher; it exists to give the
//! broadcast-encryption control flow a deterministic, invertible engine to
//! run against.

use crate::cipher::{Dwp, Ecb, KeyRep, Mac8};
use subtle::ConstantTimeEq;

const FEISTEL_ROUNDS: usize = 8;

/// The bash-backed reference implementation of [`crate::cipher::Primitives`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

fn round_function(key: &[u8], round: u8, half: &[u8; 8]) -> [u8; 8] {
    // l = 128 is always a valid security level.
    let mut sponge = bash::Sponge::new(128).unwrap_or_else(|_| unreachable!());
    sponge.step_h(key);
    sponge.step_h(&[round]);
    sponge.step_h(half);
    let mut out = [0u8; 8];
    let _ = sponge.step_g(&mut out);
    out
}

fn feistel_encrypt_block(key: &[u8], block: &mut [u8; 16]) {
    let mut l = [0u8; 8];
    let mut r = [0u8; 8];
    l.copy_from_slice(&block[..8]);
    r.copy_from_slice(&block[8..]);
    for round in 0..FEISTEL_ROUNDS {
        let f = round_function(key, round as u8, &r);
        let new_l = r;
        let mut new_r = [0u8; 8];
        for i in 0..8 {
            new_r[i] = l[i] ^ f[i];
        }
        l = new_l;
        r = new_r;
    }
    block[..8].copy_from_slice(&l);
    block[8..].copy_from_slice(&r);
}

fn feistel_decrypt_block(key: &[u8], block: &mut [u8; 16]) {
    let mut l = [0u8; 8];
    let mut r = [0u8; 8];
    l.copy_from_slice(&block[..8]);
    r.copy_from_slice(&block[8..]);
    for round in (0..FEISTEL_ROUNDS).rev() {
        let f = round_function(key, round as u8, &l);
        let new_r = l;
        let mut new_l = [0u8; 8];
        for i in 0..8 {
            new_l[i] = r[i] ^ f[i];
        }
        l = new_l;
        r = new_r;
    }
    block[..8].copy_from_slice(&l);
    block[8..].copy_from_slice(&r);
}

impl ReferenceEngine {
    fn keystream_xor(&self, key: &[u8], iv: &[u8; 16], input: &[u8], output: &mut [u8]) {
        let mut counter = 0u64;
        for (chunk_in, chunk_out) in input.chunks(16).zip(output.chunks_mut(16)) {
            let mut block = *iv;
            let ctr = counter.to_le_bytes();
            for i in 0..8 {
                block[i] ^= ctr[i];
            }
            feistel_encrypt_block(key, &mut block);
            for ((o, i), k) in chunk_out.iter_mut().zip(chunk_in).zip(block.iter()) {
                *o = i ^ k;
            }
            counter += 1;
        }
    }
}

impl Ecb for ReferenceEngine {
    fn encrypt(&self, key: &[u8], data: &mut [u8]) {
        debug_assert_eq!(data.len() % 16, 0);
        for chunk in data.chunks_mut(16) {
            let mut block = [0u8; 16];
            block.copy_from_slice(chunk);
            feistel_encrypt_block(key, &mut block);
            chunk.copy_from_slice(&block);
        }
    }

    fn decrypt(&self, key: &[u8], data: &mut [u8]) {
        debug_assert_eq!(data.len() % 16, 0);
        for chunk in data.chunks_mut(16) {
            let mut block = [0u8; 16];
            block.copy_from_slice(chunk);
            feistel_decrypt_block(key, &mut block);
            chunk.copy_from_slice(&block);
        }
    }
}

impl Mac8 for ReferenceEngine {
    fn mac(&self, key: &[u8], data: &[u8]) -> [u8; 8] {
        let mut state = [0u8; 16];
        for chunk in data.chunks(16) {
            for (s, d) in state.iter_mut().zip(chunk) {
                *s ^= *d;
            }
            feistel_encrypt_block(key, &mut state);
        }
        let mut tag = [0u8; 8];
        tag.copy_from_slice(&state[..8]);
        tag
    }
}

impl KeyRep for ReferenceEngine {
    #[allow(clippy::expect_used)]
    fn krp(&self, key: &[u8], level: [u32; 3], header: [u32; 4], out: &mut [u8]) {
        let l = out.len() * 4;
        let mut sponge =
            bash::Sponge::new(l).expect("caller only requests 16/24/32-octet keys");
        sponge.step_h(key);
        for word in level {
            sponge.step_h(&word.to_le_bytes());
        }
        for word in header {
            sponge.step_h(&word.to_le_bytes());
        }
        sponge
            .step_g(out)
            .expect("out.len() * 4 == l, the exact squeeze bound");
    }
}

impl Dwp for ReferenceEngine {
    fn wrap(&self, key: &[u8], iv: &[u8; 16], plaintext: &[u8], ciphertext: &mut [u8]) -> [u8; 8] {
        self.keystream_xor(key, iv, plaintext, ciphertext);
        let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
        mac_input.extend_from_slice(iv);
        mac_input.extend_from_slice(ciphertext);
        self.mac(key, &mac_input)
    }

    fn unwrap(
        &self,
        key: &[u8],
        iv: &[u8; 16],
        ciphertext: &[u8],
        tag: &[u8; 8],
        plaintext: &mut [u8],
    ) -> bool {
        let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
        mac_input.extend_from_slice(iv);
        mac_input.extend_from_slice(ciphertext);
        let expected = self.mac(key, &mac_input);
        let ok = bool::from(expected[..].ct_eq(&tag[..]));
        self.keystream_xor(key, iv, ciphertext, plaintext);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecb_round_trips() {
        let key = [0x11u8; 32];
        let mut data = *b"0123456789abcdef0123456789abcdef";
        let original = data;
        ReferenceEngine.encrypt(&key, &mut data[..32]);
        assert_ne!(&data[..32], &original[..32]);
        ReferenceEngine.decrypt(&key, &mut data[..32]);
        assert_eq!(&data[..32], &original[..32]);
    }

    #[test]
    fn krp_is_deterministic_and_level_separated() {
        let key = [0x22u8; 16];
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        ReferenceEngine.krp(&key, [0, 0, 0], [1, 0, 0, 0], &mut a);
        ReferenceEngine.krp(&key, [0, 0, 0], [1, 0, 0, 0], &mut b);
        assert_eq!(a, b);

        let mut c = [0u8; 16];
        ReferenceEngine.krp(&key, [0, 0, 0], [2, 0, 0, 0], &mut c);
        assert_ne!(a, c);
    }

    #[test]
    fn dwp_round_trips_and_detects_tampering() {
        let key = [0x33u8; 32];
        let iv = [0x44u8; 16];
        let plaintext = b"broadcast payload data";
        let mut ciphertext = vec![0u8; plaintext.len()];
        let tag = ReferenceEngine.wrap(&key, &iv, plaintext, &mut ciphertext);

        let mut recovered = vec![0u8; plaintext.len()];
        assert!(ReferenceEngine.unwrap(&key, &iv, &ciphertext, &tag, &mut recovered));
        assert_eq!(&recovered[..], &plaintext[..]);

        let mut bad_tag = tag;
        bad_tag[0] ^= 1;
        let mut scratch = vec![0u8; plaintext.len()];
        assert!(!ReferenceEngine.unwrap(&key, &iv, &ciphertext, &bad_tag, &mut scratch));
    }

    #[test]
    fn mac_is_sensitive_to_every_input_byte() {
        let key = [0x55u8; 16];
        let base = ReferenceEngine.mac(&key, b"message one");
        for i in 0..b"message one".len() {
            let mut tampered = *b"message one";
            tampered[i] ^= 1;
            assert_ne!(ReferenceEngine.mac(&key, &tampered), base, "byte {i} not covered");
        }
    }
}
