#![cfg_attr(not(feature = "std"), no_std)]

//! # bash
//!
//! The bash sponge hash family (STB 34.101.77): a 1536-bit permutation `F`
//! and a sponge construction built on it, hashing at security levels
//! 128/192/256 bits.
//!
//! # Usage
//! ```rust
//! use bash::{hash256, Sponge};
//!
//! // One-shot
//! let digest = hash256(b"message");
//!
//! // Streaming
//! let mut sponge = Sponge::new(128)?;
//! sponge.step_h(b"chunk 1");
//! sponge.step_h(b"chunk 2");
//! let mut out = [0u8; 32];
//! sponge.step_g(&mut out)?;
//! assert_eq!(out, digest);
//! # Ok::<(), bash::BashError>(())
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

mod engine;
// Exposed for cross-backend consistency tests and callers that need the
// raw permutation; not part of the stable curated surface.
#[doc(hidden)]
pub mod kernels;
mod oneshot;
mod streaming;
mod types;

pub use engine::{Backend, BackendKind};
pub use oneshot::{hash, hash256, hash384, hash512, verify};
pub use streaming::Sponge;
pub use types::BashError;

/// Apply the bash permutation `F` in place to a 192-octet state buffer,
/// using the global default backend.
pub fn f(block: &mut [u8; kernels::constants::STATE_BYTES]) {
    engine::dispatcher::default_backend().get().permute(block);
}

/// Name of the backend currently selected as the global default.
#[must_use]
pub fn active_backend() -> &'static str {
    engine::default_backend_name()
}
