//! Backend selection for the bash permutation.
//!
//! The reference implementation chose between scalar and vector code paths
//! via a single process-wide flag, toggled for benchmarking. That flag is
//! replaced here with a [`Backend`] trait and two implementations selected
//! per [`crate::Sponge`] at construction time (`Sponge::new`,
//! `Sponge::new_with_backend`): no mutable global state is read during
//! cryptographic operations. A default is still computed once, lazily, so
//! callers who don't care can omit the choice entirely.

use crate::kernels::constants::STATE_BYTES;
use crate::kernels::portable;

#[cfg(feature = "std")]
use std::sync::OnceLock;

/// A permutation backend: something that can apply `F` to the 192-octet
/// state buffer described by the public surface in the library's module
/// documentation.
pub trait Backend: Send + Sync {
    /// Apply the bash permutation `F` in place.
    fn permute(&self, block: &mut [u8; STATE_BYTES]);

    /// Human-readable backend name, for diagnostics.
    fn name(&self) -> &'static str;
}

/// Portable scalar backend. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portable;

impl Backend for Portable {
    fn permute(&self, block: &mut [u8; STATE_BYTES]) {
        portable::permute_bytes(block);
    }

    fn name(&self) -> &'static str {
        "portable"
    }
}

/// AVX2 256-bit vector backend. Only constructible after a feature check.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Avx2;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Backend for Avx2 {
    #[allow(unsafe_code)]
    fn permute(&self, block: &mut [u8; STATE_BYTES]) {
        // SAFETY: `Avx2` is only handed out by `BackendKind::Avx2::get()` or
        // `detect_best()`, both of which check `is_x86_feature_detected!("avx2")`
        // first.
        unsafe {
            crate::kernels::vector::permute_bytes(block);
        }
    }

    fn name(&self) -> &'static str {
        "vector-avx2"
    }
}

/// Identifies a backend without borrowing it, so it can be stored, copied,
/// and resolved to a `&'static dyn Backend` on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The portable scalar kernel.
    Portable,
    /// The AVX2 256-bit vector kernel.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Avx2,
}

impl BackendKind {
    /// Resolve to the concrete backend implementation.
    #[must_use]
    pub fn get(self) -> &'static dyn Backend {
        match self {
            Self::Portable => &Portable,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::Avx2 => &Avx2,
        }
    }
}

/// Detect the best backend available on the current CPU (or, without
/// `std`, the one enabled at compile time).
#[must_use]
pub fn detect_best() -> BackendKind {
    #[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
    {
        if is_x86_feature_detected!("avx2") {
            return BackendKind::Avx2;
        }
    }
    #[cfg(all(
        not(feature = "std"),
        any(target_arch = "x86", target_arch = "x86_64"),
        target_feature = "avx2"
    ))]
    {
        return BackendKind::Avx2;
    }
    BackendKind::Portable
}

#[cfg(feature = "std")]
static DEFAULT: OnceLock<BackendKind> = OnceLock::new();

/// The global default backend, detected once and cached thereafter.
///
/// This is the only piece of process-wide state the dispatcher keeps, and
/// it is read-only after first use: it never changes which backend an
/// already-constructed [`crate::Sponge`] uses.
#[must_use]
pub fn default_backend() -> BackendKind {
    #[cfg(feature = "std")]
    {
        *DEFAULT.get_or_init(detect_best)
    }
    #[cfg(not(feature = "std"))]
    {
        detect_best()
    }
}

/// Name of the backend that [`default_backend`] currently resolves to.
#[must_use]
pub fn default_backend_name() -> &'static str {
    default_backend().get().name()
}
