//! Interfaces to the external block-cipher family (STB 34.101.31 "belt"
//! in the reference protocol) this core treats as a collaborator: ECB
//! encryption, an 8-octet MAC, the key-replication primitive `KRP`, and
//! the authenticated data-wrap mode `DWP`. The core never implements
//! these itself; it is generic over any type providing them.

use zeroize::Zeroizing;

/// One entry of an A-key table or a user's key subset: the pair of
/// vertex numbers `(a, b)` identifying the legal-leaf set `S_{a,b}` this
/// key decrypts, plus the key octets themselves.
#[derive(Clone)]
pub struct UserKey {
    /// Non-leaf ancestor vertex (0 for the all-users special case).
    pub a: u32,
    /// Descendant vertex excluded from the legal-leaf set (0 for the
    /// all-users special case).
    pub b: u32,
    /// Key octets (16, 24, or 32 of them, matching the chosen security
    /// level). Zeroized on drop.
    pub key: Zeroizing<Vec<u8>>,
}

impl UserKey {
    /// A zero-filled entry of the given key length, ready to be written
    /// in place by a key-schedule routine.
    #[must_use]
    pub fn zeroed(key_len: usize) -> Self {
        Self {
            a: 0,
            b: 0,
            key: Zeroizing::new(vec![0u8; key_len]),
        }
    }
}

/// Block-cipher ECB mode over 16-octet blocks, under a 16/24/32-octet
/// key. `data.len()` must be a positive multiple of 16.
pub trait Ecb {
    /// Encrypt `data` in place, one 16-octet block at a time.
    fn encrypt(&self, key: &[u8], data: &mut [u8]);
    /// Decrypt `data` in place, one 16-octet block at a time.
    fn decrypt(&self, key: &[u8], data: &mut [u8]);
}

/// An 8-octet message authentication code.
pub trait Mac8 {
    /// Compute the MAC of `data` under `key`.
    fn mac(&self, key: &[u8], data: &[u8]) -> [u8; 8];
}

/// Key-replication (diversification): derives a same-length child key
/// from a parent key plus a 12-octet level tag and a 16-octet header tag.
pub trait KeyRep {
    /// Write a key of `out.len()` octets, derived from `key`, `level`,
    /// and `header`, into `out`. `out.len() == key.len()` always holds
    /// for calls made by this crate.
    fn krp(&self, key: &[u8], level: [u32; 3], header: [u32; 4], out: &mut [u8]);
}

/// Authenticated-encryption data-wrap mode: confidentiality plus an
/// 8-octet tag, under a 16-octet synchro-vector (nonce/IV).
pub trait Dwp {
    /// Encrypt `plaintext` into `ciphertext` (same length) and compute
    /// the 8-octet authentication tag.
    fn wrap(&self, key: &[u8], iv: &[u8; 16], plaintext: &[u8], ciphertext: &mut [u8]) -> [u8; 8];
    /// Decrypt `ciphertext` into `plaintext` (same length) and verify the
    /// 8-octet tag in constant time. Returns `false` on mismatch, leaving
    /// `plaintext` in an unspecified state the caller must not use.
    fn unwrap(
        &self,
        key: &[u8],
        iv: &[u8; 16],
        ciphertext: &[u8],
        tag: &[u8; 8],
        plaintext: &mut [u8],
    ) -> bool;
}

/// The full external primitive suite the broadcast-encryption core
/// consumes. Anything implementing the four narrower traits gets this
/// for free.
pub trait Primitives: Ecb + Mac8 + KeyRep + Dwp {}

impl<T: Ecb + Mac8 + KeyRep + Dwp> Primitives for T {}
