//! Wire codec and protocol steps for the four broadcast messages: the
//! cover header `X1`, the wrapped session-key block `X2..X_{d+2}`, the
//! authenticated payload `Y`, and their receiver-side counterparts.
//!
//! Every builder follows the two-call sizing idiom: a `*_count` function
//! reports how large a buffer to allocate, and the matching plain
//! function fills a caller-supplied buffer and returns the number of
//! octets actually written.

use crate::cipher::{Dwp, Ecb, KeyRep, Mac8, UserKey};
use crate::cover;
use crate::error::BeError;
use crate::tree::{self, height_is_valid, leaves_bitmap_size};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

const SIZE_D: usize = 4;
const SIZE_P: usize = 4;
const SIZE_IMITO: usize = 8;
const SIZE_SYNHRO: usize = 16;

fn encode_cover(pairs: &[(u32, u32)], out: &mut [u8]) -> usize {
    out[0..SIZE_D].copy_from_slice(&(pairs.len() as u32).to_le_bytes());
    let mut offset = SIZE_D;
    for &(a, b) in pairs {
        out[offset..offset + SIZE_P].copy_from_slice(&a.to_le_bytes());
        offset += SIZE_P;
        out[offset..offset + SIZE_P].copy_from_slice(&b.to_le_bytes());
        offset += SIZE_P;
    }
    offset
}

fn decode_cover(x1: &[u8]) -> Result<Vec<(u32, u32)>, BeError> {
    if x1.len() < SIZE_D {
        return Err(BeError::BadFormat);
    }
    let d = u32::from_le_bytes(x1[0..SIZE_D].try_into().map_err(|_| BeError::BadFormat)?) as usize;
    let needed = SIZE_D + d * 2 * SIZE_P;
    if x1.len() < needed {
        return Err(BeError::BadFormat);
    }
    let mut pairs = Vec::with_capacity(d);
    let mut offset = SIZE_D;
    for _ in 0..d {
        let a = u32::from_le_bytes(x1[offset..offset + SIZE_P].try_into().unwrap_or_default());
        offset += SIZE_P;
        let b = u32::from_le_bytes(x1[offset..offset + SIZE_P].try_into().unwrap_or_default());
        offset += SIZE_P;
        pairs.push((a, b));
    }
    Ok(pairs)
}

/// Derive the pair `(a, b)`'s A-key table entry directly from the centre
/// secret `s` (the path taken by the sender, who has no precomputed
/// table).
fn derive_table_entry<P: KeyRep>(s: &[u8], engine: &P, key_len: usize, a: u32, b: u32) -> Zeroizing<Vec<u8>> {
    let mut cur = Zeroizing::new(vec![0u8; key_len]);
    engine.krp(s, [0, 0, 0], [a, 0, 0, 0], &mut cur);
    if a == 0 && b == 0 {
        let mut stage = Zeroizing::new(vec![0u8; key_len]);
        engine.krp(&cur, [1, 0, 0], [0, 0, 0, 0], &mut stage);
        return stage;
    }
    let da = tree::depth(a);
    let db = tree::depth(b);
    let l = db - da;
    let mut path = vec![0u32; l as usize + 1];
    path[l as usize] = b;
    for t in (0..l as usize).rev() {
        path[t] = path[t + 1] / 2;
    }
    for i in 1..=l {
        let header = u32::from(path[i as usize] != 2 * path[(i - 1) as usize]) + 1;
        let mut next = Zeroizing::new(vec![0u8; key_len]);
        engine.krp(&cur, [i, 0, 0], [header, 0, 0, 0], &mut next);
        cur = next;
    }
    cur
}

/// The one extra key-replication step that turns a table entry for
/// `(a, b)` into the leaf-cover encryption/decryption key.
fn table_entry_to_dk<P: KeyRep>(entry_key: &[u8], engine: &P, key_len: usize, a: u32, b: u32) -> Zeroizing<Vec<u8>> {
    let level0 = if a == 0 && b == 0 { 2 } else { tree::depth(b) - tree::depth(a) + 1 };
    let mut dk = Zeroizing::new(vec![0u8; key_len]);
    engine.krp(entry_key, [level0, 0, 0], [0, 0, 0, 0], &mut dk);
    dk
}

fn derive_dk_from_secret<P: KeyRep>(s: &[u8], engine: &P, key_len: usize, a: u32, b: u32) -> Zeroizing<Vec<u8>> {
    let entry = derive_table_entry(s, engine, key_len, a, b);
    table_entry_to_dk(&entry, engine, key_len, a, b)
}

/// Upper bound (not always exact — see the crate's design notes) on the
/// size of the `X1` header for a revoked-leaf bitmap with an unknown
/// exact cover size.
///
/// # Errors
/// Returns [`BeError::BadParam`] for an invalid `h` or undersized `revoked`.
pub fn form_b_msg_x_count(h: u8, revoked: &[u8]) -> Result<usize, BeError> {
    if !height_is_valid(h) || revoked.len() < leaves_bitmap_size(h) {
        return Err(BeError::BadParam);
    }
    let r = cover::count_revoked(h, revoked);
    let bound = cover::max_cover(r);
    Ok(SIZE_D + bound as usize * 2 * SIZE_P)
}

/// Build the `X1` cover header into `out`, returning the exact number of
/// octets written.
///
/// # Errors
/// Returns [`BeError::BadParam`] if `h`/`revoked` are malformed or `out`
/// is too small.
pub fn form_b_msg_x(h: u8, revoked: &[u8], out: &mut [u8]) -> Result<usize, BeError> {
    let pairs = cover::create_ids_cover(h, revoked)?;
    let needed = SIZE_D + pairs.len() * 2 * SIZE_P;
    if out.len() < needed {
        return Err(BeError::BadParam);
    }
    Ok(encode_cover(&pairs, out))
}

/// Build the `X1` cover header, allocating the output buffer.
///
/// # Errors
/// See [`form_b_msg_x`].
pub fn form_b_msg_x_alloc(h: u8, revoked: &[u8]) -> Result<Vec<u8>, BeError> {
    let pairs = cover::create_ids_cover(h, revoked)?;
    let mut out = vec![0u8; SIZE_D + pairs.len() * 2 * SIZE_P];
    encode_cover(&pairs, &mut out);
    Ok(out)
}

/// Exact size of the `X2..X_{d+2}` block for a parsed `X1` header.
///
/// # Errors
/// Returns [`BeError::BadFormat`] if `x1` does not parse.
pub fn form_e_msg_x_count(x1: &[u8]) -> Result<usize, BeError> {
    let pairs = decode_cover(x1)?;
    Ok(SIZE_IMITO + pairs.len() * SIZE_SYNHRO)
}

/// Build the MAC-then-wrapped-keys block under centre secret `s` and
/// session key `k`.
///
/// # Errors
/// Returns [`BeError::BadParam`] for a bad key length or undersized
/// `out`, [`BeError::BadFormat`] if `x1` does not parse.
pub fn form_e_msg_x<P: Ecb + Mac8 + KeyRep>(
    x1: &[u8],
    s: &[u8],
    k: &[u8; 16],
    engine: &P,
    out: &mut [u8],
) -> Result<usize, BeError> {
    if !matches!(s.len(), 16 | 24 | 32) {
        return Err(BeError::BadParam);
    }
    let pairs = decode_cover(x1)?;
    let needed = SIZE_IMITO + pairs.len() * SIZE_SYNHRO;
    if out.len() < needed {
        return Err(BeError::BadParam);
    }
    out[..SIZE_IMITO].copy_from_slice(&engine.mac(k, x1));
    let mut offset = SIZE_IMITO;
    for &(a, b) in &pairs {
        let dk = derive_dk_from_secret(s, engine, s.len(), a, b);
        let mut block = *k;
        engine.encrypt(&dk, &mut block);
        out[offset..offset + SIZE_SYNHRO].copy_from_slice(&block);
        offset += SIZE_SYNHRO;
    }
    Ok(offset)
}

/// Build the wrapped-keys block, allocating the output buffer.
///
/// # Errors
/// See [`form_e_msg_x`].
pub fn form_e_msg_x_alloc<P: Ecb + Mac8 + KeyRep>(
    x1: &[u8],
    s: &[u8],
    k: &[u8; 16],
    engine: &P,
) -> Result<Vec<u8>, BeError> {
    let mut out = vec![0u8; form_e_msg_x_count(x1)?];
    form_e_msg_x(x1, s, k, engine, &mut out)?;
    Ok(out)
}

/// Size of the `Y` payload message for a plaintext of `size_m` octets.
#[must_use]
pub const fn form_a_msg_y_count(size_m: usize) -> usize {
    SIZE_SYNHRO + size_m + SIZE_IMITO
}

/// Build the synchro-vector-prefixed, DWP-wrapped payload.
///
/// # Errors
/// Returns [`BeError::BadParam`] for an empty message or undersized `out`.
pub fn form_a_msg_y<P: Dwp>(k: &[u8], t: &[u8; 16], m: &[u8], engine: &P, out: &mut [u8]) -> Result<usize, BeError> {
    if m.is_empty() {
        return Err(BeError::BadParam);
    }
    let needed = form_a_msg_y_count(m.len());
    if out.len() < needed {
        return Err(BeError::BadParam);
    }
    out[..SIZE_SYNHRO].copy_from_slice(t);
    let tag = engine.wrap(k, t, m, &mut out[SIZE_SYNHRO..SIZE_SYNHRO + m.len()]);
    out[SIZE_SYNHRO + m.len()..needed].copy_from_slice(&tag);
    Ok(needed)
}

/// Build the payload message, allocating the output buffer.
///
/// # Errors
/// See [`form_a_msg_y`].
pub fn form_a_msg_y_alloc<P: Dwp>(k: &[u8], t: &[u8; 16], m: &[u8], engine: &P) -> Result<Vec<u8>, BeError> {
    let mut out = vec![0u8; form_a_msg_y_count(m.len())];
    form_a_msg_y(k, t, m, engine, &mut out)?;
    Ok(out)
}

/// Size of the plaintext recovered from an `AY` payload of `ay_len` octets.
///
/// # Errors
/// Returns [`BeError::BadFormat`] if `ay_len` is too small to be valid.
pub const fn analyz_a_msg_y_count(ay_len: usize) -> Result<usize, BeError> {
    match ay_len.checked_sub(SIZE_SYNHRO + SIZE_IMITO) {
        Some(len) => Ok(len),
        None => Err(BeError::BadFormat),
    }
}

/// Verify and decrypt an `AY` payload into `out`.
///
/// # Errors
/// Returns [`BeError::BadFormat`] if `ay` is too short, [`BeError::BadParam`]
/// if `out` is the wrong size, [`BeError::BadMac`] if the tag does not verify.
pub fn analyz_a_msg_y<P: Dwp>(k: &[u8], ay: &[u8], engine: &P, out: &mut [u8]) -> Result<usize, BeError> {
    let plain_len = analyz_a_msg_y_count(ay.len())?;
    if out.len() != plain_len {
        return Err(BeError::BadParam);
    }
    let mut t = [0u8; 16];
    t.copy_from_slice(&ay[..SIZE_SYNHRO]);
    let ciphertext = &ay[SIZE_SYNHRO..SIZE_SYNHRO + plain_len];
    let mut tag = [0u8; 8];
    tag.copy_from_slice(&ay[SIZE_SYNHRO + plain_len..]);
    if engine.unwrap(k, &t, ciphertext, &tag, out) {
        Ok(plain_len)
    } else {
        Err(BeError::BadMac)
    }
}

/// Find the cover entry covering user `u`'s leaf in `x1` and derive the
/// matching leaf-cover decryption key from the user's own key subset.
///
/// Returns the 0-based cover index and the decryption key.
///
/// # Errors
/// Returns [`BeError::Revoked`] if no cover entry admits `u`,
/// [`BeError::BadFormat`] if `x1` does not parse, [`BeError::Internal`]
/// if the user's key subset is inconsistent with `x1` (it was not built
/// for the same `h`/table).
pub fn analyz_b_msg_x<P: KeyRep>(
    h: u8,
    u: u32,
    user_keys: &[UserKey],
    x1: &[u8],
    engine: &P,
) -> Result<(u32, Zeroizing<Vec<u8>>), BeError> {
    if !height_is_valid(h) {
        return Err(BeError::BadParam);
    }
    let n = tree::leaf_count(h);
    if u == 0 || u > n {
        return Err(BeError::BadParam);
    }
    let Some(first) = user_keys.first() else {
        return Err(BeError::BadParam);
    };
    let key_len = first.key.len();
    let leaf = u + n - 1;

    for (e, &(a, b)) in decode_cover(x1)?.iter().enumerate() {
        if !tree::check_leaf(h, a, b, leaf).map_err(|_| BeError::BadFormat)? {
            continue;
        }
        let entry = user_keys
            .iter()
            .find(|entry| entry.a == a && entry.b == b)
            .ok_or(BeError::Internal)?;
        if entry.key.len() != key_len {
            return Err(BeError::Internal);
        }
        let dk = table_entry_to_dk(&entry.key, engine, key_len, a, b);
        return Ok((e as u32, dk));
    }
    Err(BeError::Revoked)
}

/// Recover the MAC and the decrypted session key `K` for cover index `e`
/// out of the `X2..X_{d+2}` block, under decryption key `dk`.
///
/// # Errors
/// Returns [`BeError::BadParam`] if `e >= d`, [`BeError::BadFormat`] if
/// `x2` is shorter than `d` demands.
pub fn analyz_e_msg_x<P: Ecb>(x2: &[u8], d: u32, e: u32, dk: &[u8], engine: &P) -> Result<([u8; 8], [u8; 16]), BeError> {
    if e >= d {
        return Err(BeError::BadParam);
    }
    let needed = SIZE_IMITO + d as usize * SIZE_SYNHRO;
    if x2.len() < needed {
        return Err(BeError::BadFormat);
    }
    let mut mac = [0u8; 8];
    mac.copy_from_slice(&x2[..SIZE_IMITO]);
    let offset = SIZE_IMITO + e as usize * SIZE_SYNHRO;
    let mut k = [0u8; 16];
    k.copy_from_slice(&x2[offset..offset + SIZE_SYNHRO]);
    engine.decrypt(dk, &mut k);
    Ok((mac, k))
}

/// Verify, in constant time, that `mac` is the MAC of `x1` under `k`.
///
/// # Errors
/// Returns [`BeError::BadMac`] on mismatch.
pub fn check_msg_x<P: Mac8>(x1: &[u8], k: &[u8; 16], mac: &[u8; 8], engine: &P) -> Result<(), BeError> {
    let expected = engine.mac(k, x1);
    if bool::from(expected[..].ct_eq(&mac[..])) {
        Ok(())
    } else {
        Err(BeError::BadMac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceEngine;
    use crate::schedule::{gen_users_keys_alloc, get_user_keys_alloc};

    #[test]
    fn cover_header_round_trips_through_the_wire_format() {
        let h = 4u8;
        let mut revoked = vec![0u8; leaves_bitmap_size(h)];
        revoked[0] = 0b0000_0101; // leaves 0 and 2 revoked
        let x1 = form_b_msg_x_alloc(h, &revoked).unwrap();
        let pairs = decode_cover(&x1).unwrap();
        assert!(!pairs.is_empty());
        let reencoded = {
            let mut buf = vec![0u8; SIZE_D + pairs.len() * 2 * SIZE_P];
            encode_cover(&pairs, &mut buf);
            buf
        };
        assert_eq!(x1, reencoded);
    }

    #[test]
    fn broadcast_round_trip_recovers_the_message_for_a_legal_user() {
        let h = 4u8;
        let s = [0x77u8; 16];
        let k = [0x88u8; 16];
        let t = [0x99u8; 16];
        let m = b"hello, legal leaf";

        let table = gen_users_keys_alloc(h, &s, &ReferenceEngine).unwrap();

        let mut revoked = vec![0u8; leaves_bitmap_size(h)];
        revoked[0] = 0b0000_0001; // leaf 0 revoked
        let x1 = form_b_msg_x_alloc(h, &revoked).unwrap();
        let x2 = form_e_msg_x_alloc(&x1, &s, &k, &ReferenceEngine).unwrap();
        let y = form_a_msg_y_alloc(&k, &t, m, &ReferenceEngine).unwrap();

        let legal_user = 3u32; // leaf index 2, not revoked
        let user_keys = get_user_keys_alloc(h, legal_user, &table).unwrap();

        let (e, dk) = analyz_b_msg_x(h, legal_user, &user_keys, &x1, &ReferenceEngine).unwrap();
        let d = decode_cover(&x1).unwrap().len() as u32;
        let (mac, recovered_k) = analyz_e_msg_x(&x2, d, e, &dk, &ReferenceEngine).unwrap();
        check_msg_x(&x1, &recovered_k, &mac, &ReferenceEngine).unwrap();
        assert_eq!(recovered_k, k);

        let mut out = vec![0u8; analyz_a_msg_y_count(y.len()).unwrap()];
        analyz_a_msg_y(&recovered_k, &y, &ReferenceEngine, &mut out).unwrap();
        assert_eq!(out, m);
    }

    #[test]
    fn revoked_user_is_rejected() {
        let h = 4u8;
        let s = [0x33u8; 16];
        let table = gen_users_keys_alloc(h, &s, &ReferenceEngine).unwrap();

        let mut revoked = vec![0u8; leaves_bitmap_size(h)];
        revoked[0] = 0b0000_0001; // leaf 0 revoked -> user 1
        let x1 = form_b_msg_x_alloc(h, &revoked).unwrap();

        let revoked_user = 1u32;
        let user_keys = get_user_keys_alloc(h, revoked_user, &table).unwrap();
        assert_eq!(
            analyz_b_msg_x(h, revoked_user, &user_keys, &x1, &ReferenceEngine).unwrap_err(),
            BeError::Revoked
        );
    }

    #[test]
    fn tampering_with_x1_fails_the_mac_check() {
        let h = 4u8;
        let s = [0x11u8; 16];
        let k = [0x22u8; 16];
        let revoked = vec![0u8; leaves_bitmap_size(h)];
        let mut x1 = form_b_msg_x_alloc(h, &revoked).unwrap();
        let x2 = form_e_msg_x_alloc(&x1, &s, &k, &ReferenceEngine).unwrap();
        let mac: [u8; 8] = x2[..8].try_into().unwrap();

        x1[SIZE_D] ^= 1;
        assert_eq!(
            check_msg_x(&x1, &k, &mac, &ReferenceEngine).unwrap_err(),
            BeError::BadMac
        );
    }

    #[test]
    fn no_revocation_special_case_round_trips() {
        let h = 4u8;
        let s = [0x55u8; 32];
        let k = [0x66u8; 16];
        let t = [0x77u8; 16];
        let m = b"special case payload";

        let table = gen_users_keys_alloc(h, &s, &ReferenceEngine).unwrap();
        let revoked = vec![0u8; leaves_bitmap_size(h)];
        let x1 = form_b_msg_x_alloc(h, &revoked).unwrap();
        assert_eq!(decode_cover(&x1).unwrap(), vec![(0, 0)]);

        let x2 = form_e_msg_x_alloc(&x1, &s, &k, &ReferenceEngine).unwrap();
        let user_keys = get_user_keys_alloc(h, 7, &table).unwrap();
        let (e, dk) = analyz_b_msg_x(h, 7, &user_keys, &x1, &ReferenceEngine).unwrap();
        assert_eq!(e, 0);
        let (mac, recovered_k) = analyz_e_msg_x(&x2, 1, e, &dk, &ReferenceEngine).unwrap();
        check_msg_x(&x1, &recovered_k, &mac, &ReferenceEngine).unwrap();
        assert_eq!(recovered_k, k);

        let y = form_a_msg_y_alloc(&k, &t, m, &ReferenceEngine).unwrap();
        let mut out = vec![0u8; analyz_a_msg_y_count(y.len()).unwrap()];
        analyz_a_msg_y(&recovered_k, &y, &ReferenceEngine, &mut out).unwrap();
        assert_eq!(out, m);
    }
}
