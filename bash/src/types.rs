//! Shared types used across the bash library.

use core::fmt;
#[cfg(feature = "std")]
use std::error;

/// Errors the sponge surface can return.
///
/// Mirrors the subset of the broadcast-encryption core's error taxonomy
/// that applies to the hash layer: malformed parameters are the only
/// failure mode `bash` itself can produce (it has no I/O, no allocation
/// that can be exhausted by anything but the caller's own buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BashError {
    /// The security level was not a positive multiple of 16 not exceeding
    /// 256, or the requested output length exceeded `level / 4` octets.
    BadParam,
}

impl fmt::Display for BashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadParam => write!(f, "bad parameter: invalid security level or output length"),
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for BashError {}

/// Validate a security level in bits: must be a positive multiple of 16,
/// not exceeding 256.
#[must_use]
pub const fn level_is_valid(l: usize) -> bool {
    l > 0 && l <= 256 && l % 16 == 0
}

/// Sponge rate in octets for security level `l` (bits): `192 - l/4`.
#[must_use]
pub const fn rate_for_level(l: usize) -> usize {
    192 - l / 4
}

/// Sponge capacity in octets for security level `l` (bits): `l/4`.
#[must_use]
pub const fn capacity_for_level(l: usize) -> usize {
    l / 4
}
