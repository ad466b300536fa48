//! Key schedule: builds the full A-key table from a centre secret, and
//! selects one user's keys out of it.
//!
//! The A-key table holds one entry per pair `(a, b)` with `a` a non-leaf
//! vertex and `b` a proper descendant of `a`, plus the single all-users
//! entry `(0, 0)`. Entries are grouped by `depth(a)`; [`offset_a_key`]
//! gives the index of the first entry for a given depth. Within a depth,
//! each `a` owns a contiguous run of `2^(h - depth(a) + 1) - 2` entries,
//! one per descendant `b`, built as a hash chain from a single seed.

use crate::cipher::{KeyRep, UserKey};
use crate::error::BeError;
use crate::tree::{self, height_is_valid};
use zeroize::Zeroizing;

/// Index of the first A-key table entry belonging to a vertex at depth
/// `d`, in a height-`h` tree. Entry 0 is the all-users key; depth-0
/// entries (the root's descendants) start at index 1.
#[must_use]
pub fn offset_a_key(h: u8, d: u32) -> u32 {
    let h = u32::from(h);
    let mut offset: u32 = 1;
    for i in 0..d {
        offset += (1u32 << i) * ((1u32 << (h - i + 1)) - 2);
    }
    offset
}

/// Number of entries [`gen_users_keys`] writes for a height-`h` tree.
///
/// # Errors
/// Returns [`BeError::BadParam`] if `h` is out of range.
pub fn gen_users_keys_count(h: u8) -> Result<u32, BeError> {
    if !height_is_valid(h) {
        return Err(BeError::BadParam);
    }
    Ok(offset_a_key(h, u32::from(h)))
}

/// Build the full A-key table under centre secret `s`, for a height-`h`
/// tree and key length `s.len()` octets (16, 24, or 32).
///
/// `out` must have exactly [`gen_users_keys_count`] entries, each already
/// allocated at `s.len()` key octets (see [`UserKey::zeroed`]).
///
/// # Errors
/// Returns [`BeError::BadParam`] if `h` or `s.len()` is out of range, or
/// `out` is not sized to match.
pub fn gen_users_keys<P: KeyRep>(
    h: u8,
    s: &[u8],
    engine: &P,
    out: &mut [UserKey],
) -> Result<(), BeError> {
    if !height_is_valid(h) {
        return Err(BeError::BadParam);
    }
    let key_len = s.len();
    if !matches!(key_len, 16 | 24 | 32) {
        return Err(BeError::BadParam);
    }
    let count = gen_users_keys_count(h)? as usize;
    if out.len() != count || out.iter().any(|entry| entry.key.len() != key_len) {
        return Err(BeError::BadParam);
    }

    let n = tree::leaf_count(h);
    let zero_level = [0u32; 3];
    let zero_header = [0u32; 4];

    // Step 2: derive the table root A from the centre secret.
    let mut a = Zeroizing::new(vec![0u8; key_len]);
    engine.krp(s, zero_level, zero_header, &mut a);

    // Step 3: the all-users special case, S_{0,0}.
    out[0].a = 0;
    out[0].b = 0;
    engine.krp(&a, [1, 0, 0], zero_header, &mut out[0].key);

    // Step 4: one independent seed per non-leaf vertex, then a hash chain
    // down to every descendant.
    let mut temp_keys: Vec<Zeroizing<Vec<u8>>> = (0..n as usize)
        .map(|_| Zeroizing::new(vec![0u8; key_len]))
        .collect();

    for i in 1..n {
        let mut header = zero_header;
        header[0] = i;
        engine.krp(s, zero_level, header, &mut temp_keys[i as usize]);

        let d = tree::depth(i);
        for t in 0..(u32::from(h) - d) {
            let j_start = (1u32 << t) * i;
            for j in j_start..j_start + (1u32 << t) {
                let count = offset_a_key(h, d) + j - (1u32 << (d + 1));
                let init_key: Zeroizing<Vec<u8>> = if i == j {
                    temp_keys[j as usize].clone()
                } else {
                    out[count as usize].key.clone()
                };

                let idx_left = (count + j) as usize;
                let idx_right = idx_left + 1;

                out[idx_left].a = i;
                out[idx_left].b = 2 * j;
                engine.krp(&init_key, [t + 1, 0, 0], [1, 0, 0, 0], &mut out[idx_left].key);

                out[idx_right].a = i;
                out[idx_right].b = 2 * j + 1;
                engine.krp(&init_key, [t + 1, 0, 0], [2, 0, 0, 0], &mut out[idx_right].key);
            }
        }
    }
    Ok(())
}

/// Build the full A-key table, allocating the output table.
///
/// # Errors
/// See [`gen_users_keys`].
pub fn gen_users_keys_alloc<P: KeyRep>(
    h: u8,
    s: &[u8],
    engine: &P,
) -> Result<Vec<UserKey>, BeError> {
    let count = gen_users_keys_count(h)? as usize;
    let mut out: Vec<UserKey> = (0..count).map(|_| UserKey::zeroed(s.len())).collect();
    gen_users_keys(h, s, engine, &mut out)?;
    Ok(out)
}

/// Number of entries [`get_user_keys`] writes for a height-`h` tree.
///
/// # Errors
/// Returns [`BeError::BadParam`] if `h` is out of range.
pub fn get_user_keys_count(h: u8) -> Result<u32, BeError> {
    if !height_is_valid(h) {
        return Err(BeError::BadParam);
    }
    let h = u32::from(h);
    Ok(h * (h + 1) / 2 + 1)
}

/// Select user `u`'s keys (`1 <= u <= 2^h`) out of the A-key table `a_keys`
/// built by [`gen_users_keys`].
///
/// `out` must have exactly [`get_user_keys_count`] entries, each already
/// allocated at the table's key length.
///
/// # Errors
/// Returns [`BeError::BadParam`] for out-of-range `h`/`u` or a size
/// mismatch, [`BeError::Internal`] if `a_keys` is shorter than the table
/// layout demands (it was not built by [`gen_users_keys`] for this `h`).
pub fn get_user_keys(h: u8, u: u32, a_keys: &[UserKey], out: &mut [UserKey]) -> Result<(), BeError> {
    if !height_is_valid(h) {
        return Err(BeError::BadParam);
    }
    let n = tree::leaf_count(h);
    if u == 0 || u > n {
        return Err(BeError::BadParam);
    }
    let count = get_user_keys_count(h)? as usize;
    if out.len() != count || a_keys.is_empty() {
        return Err(BeError::BadParam);
    }
    let key_len = a_keys[0].key.len();
    if out.iter().any(|entry| entry.key.len() != key_len) {
        return Err(BeError::BadParam);
    }

    out[0].a = 0;
    out[0].b = 0;
    out[0].key.copy_from_slice(&a_keys[0].key);
    let mut next = 1usize;

    // Path from the user's leaf up to the root: v[h] is the leaf, v[0] is
    // the root.
    let h_usize = h as usize;
    let mut v = vec![0u32; h_usize + 1];
    v[h_usize] = u + n - 1;
    for t in (0..h_usize).rev() {
        v[t] = v[t + 1] / 2;
    }

    for i in 0..h_usize {
        let d = tree::depth(v[i]);
        for j in i..h_usize {
            let count = offset_a_key(h, d) + 2 * v[j] - (1u32 << (d + 1));
            let (src_idx, b) = if v[j + 1] == 2 * v[j] {
                (count as usize + 1, 2 * v[j] + 1)
            } else {
                (count as usize, 2 * v[j])
            };
            let source = a_keys.get(src_idx).ok_or(BeError::Internal)?;
            if source.key.len() != key_len {
                return Err(BeError::Internal);
            }
            out[next].a = v[i];
            out[next].b = b;
            out[next].key.copy_from_slice(&source.key);
            next += 1;
        }
    }
    Ok(())
}

/// Select user `u`'s keys, allocating the output table.
///
/// # Errors
/// See [`get_user_keys`].
pub fn get_user_keys_alloc(h: u8, u: u32, a_keys: &[UserKey]) -> Result<Vec<UserKey>, BeError> {
    if a_keys.is_empty() {
        return Err(BeError::BadParam);
    }
    let key_len = a_keys[0].key.len();
    let count = get_user_keys_count(h)? as usize;
    let mut out: Vec<UserKey> = (0..count).map(|_| UserKey::zeroed(key_len)).collect();
    get_user_keys(h, u, a_keys, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceEngine;
    use crate::tree::check_leaf;

    #[test]
    fn offset_matches_known_row_for_height_three() {
        assert_eq!(offset_a_key(3, 0), 1);
        assert_eq!(offset_a_key(3, 1), 15);
        assert_eq!(offset_a_key(3, 2), 27);
        assert_eq!(offset_a_key(3, 3), 35);
    }

    #[test]
    fn gen_users_keys_count_matches_offset_at_full_depth() {
        assert_eq!(gen_users_keys_count(3).unwrap(), 35);
        assert_eq!(gen_users_keys_count(4).unwrap(), offset_a_key(4, 4));
    }

    #[test]
    fn get_user_keys_count_is_triangular() {
        assert_eq!(get_user_keys_count(3).unwrap(), 7);
        assert_eq!(get_user_keys_count(4).unwrap(), 11);
    }

    #[test]
    fn special_key_is_shared_by_every_user() {
        let s = [0x42u8; 16];
        let table = gen_users_keys_alloc(3, &s, &ReferenceEngine).unwrap();
        let k1 = get_user_keys_alloc(3, 1, &table).unwrap();
        let k5 = get_user_keys_alloc(3, 5, &table).unwrap();
        assert_eq!(k1[0].key, k5[0].key);
        assert_eq!((k1[0].a, k1[0].b), (0, 0));
    }

    #[test]
    fn every_user_key_matches_an_a_key_table_entry() {
        let s = [0x99u8; 24];
        let table = gen_users_keys_alloc(4, &s, &ReferenceEngine).unwrap();
        for u in 1..=16u32 {
            let keys = get_user_keys_alloc(4, u, &table).unwrap();
            for uk in &keys[1..] {
                let found = table.iter().any(|ak| ak.a == uk.a && ak.b == uk.b && ak.key == uk.key);
                assert!(found, "user {u} key (a={}, b={}) has no table entry", uk.a, uk.b);
            }
        }
    }

    #[test]
    fn every_user_key_legal_set_contains_their_own_leaf_but_not_others() {
        let s = [0x11u8; 32];
        let h = 4u8;
        let n = tree::leaf_count(h);
        let table = gen_users_keys_alloc(h, &s, &ReferenceEngine).unwrap();
        for u in 1..=n {
            let keys = get_user_keys_alloc(h, u, &table).unwrap();
            let leaf = u + n - 1;
            for uk in &keys {
                assert!(check_leaf(h, uk.a, uk.b, leaf).unwrap(), "user {u}'s own leaf excluded by (a={},b={})", uk.a, uk.b);
            }
        }
    }

    #[test]
    fn gen_users_keys_rejects_wrong_output_size() {
        let s = [0u8; 16];
        let mut out = vec![UserKey::zeroed(16); 3];
        assert_eq!(
            gen_users_keys(3, &s, &ReferenceEngine, &mut out),
            Err(BeError::BadParam)
        );
    }

    #[test]
    fn get_user_keys_rejects_out_of_range_user() {
        let s = [0u8; 16];
        let table = gen_users_keys_alloc(3, &s, &ReferenceEngine).unwrap();
        let mut out = vec![UserKey::zeroed(16); get_user_keys_count(3).unwrap() as usize];
        assert_eq!(
            get_user_keys(3, 0, &table, &mut out),
            Err(BeError::BadParam)
        );
        assert_eq!(
            get_user_keys(3, 9, &table, &mut out),
            Err(BeError::BadParam)
        );
    }
}
