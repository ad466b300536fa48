//! # be
//!
//! Subset-Difference broadcast-encryption core: complete-binary-tree
//! arithmetic, a Subset-Difference cover construction, an A-key schedule,
//! and the four protocol messages (`X1` cover header, wrapped session
//! keys, authenticated payload, and their receiver-side counterparts).
//!
//! This crate treats the underlying block cipher, MAC, key-replication
//! primitive, and authenticated data-wrap mode (STB 34.101.31 "belt" in
//! the reference protocol) as an external collaborator: see [`cipher`]
//! for the trait boundary. [`reference`] provides a bash-sponge-backed
//! stand-in for testing; it is not a standards-track cipher.
//!
//! # Usage
//! ```rust
//! use be::reference::ReferenceEngine;
//! use be::{codec, schedule, tree};
//!
//! let h = 4u8;
//! let s = [0x11u8; 16]; // centre secret
//! let k = [0x22u8; 16]; // session key
//! let t = [0x33u8; 16]; // synchro-vector
//! let engine = ReferenceEngine;
//!
//! let table = schedule::gen_users_keys_alloc(h, &s, &engine)?;
//!
//! let mut revoked = vec![0u8; tree::leaves_bitmap_size(h)];
//! revoked[0] = 0b0000_0001; // leaf 0 (user 1) revoked
//! let x1 = codec::form_b_msg_x_alloc(h, &revoked)?;
//! let x2 = codec::form_e_msg_x_alloc(&x1, &s, &k, &engine)?;
//! let y = codec::form_a_msg_y_alloc(&k, &t, b"hello", &engine)?;
//!
//! let user_keys = schedule::get_user_keys_alloc(h, 3, &table)?; // user 3, not revoked
//! let (e, dk) = codec::analyz_b_msg_x(h, 3, &user_keys, &x1, &engine)?;
//! let (mac, session_key) = codec::analyz_e_msg_x(&x2, 1, e, &dk, &engine)?;
//! codec::check_msg_x(&x1, &session_key, &mac, &engine)?;
//! assert_eq!(session_key, k);
//!
//! let mut plaintext = vec![0u8; codec::analyz_a_msg_y_count(y.len())?];
//! codec::analyz_a_msg_y(&session_key, &y, &engine, &mut plaintext)?;
//! assert_eq!(plaintext, b"hello");
//! # Ok::<(), be::error::BeError>(())
//! ```

/// External cipher-suite traits and the per-subset key type.
pub mod cipher;
/// Wire codec and protocol steps for the four broadcast messages.
pub mod codec;
/// Subset-Difference cover construction.
pub mod cover;
/// Error taxonomy.
pub mod error;
/// A bash-sponge-backed stand-in for the external cipher suite, for tests.
pub mod reference;
/// A-key table construction and per-user key selection.
pub mod schedule;
/// Complete-binary-tree vertex arithmetic.
pub mod tree;

pub use cipher::{Dwp, Ecb, KeyRep, Mac8, Primitives, UserKey};
pub use error::BeError;
