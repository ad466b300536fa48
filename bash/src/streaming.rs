//! Sponge context: `Start`/`StepH`/`StepG`/`StepV`.
//!
//! A fixed-size, allocation-free state machine over the 192-octet bash
//! state, mirroring the reference `bashavx2_Start`/`StepH`/`StepG`/`StepV`
//! surface but replacing the implicit process-wide scalar/vector flag with
//! an explicit [`BackendKind`] chosen at construction.

use crate::engine::{default_backend_name, BackendKind};
use crate::kernels::constants::STATE_BYTES;
use crate::types::{capacity_for_level, level_is_valid, rate_for_level, BashError};
use subtle::ConstantTimeEq;

/// Maximum squeeze length in octets, reached at the top security level
/// (`l = 256` gives `l/4 = 64`).
const MAX_HASH_LEN: usize = 64;

/// Sponge context over the 192-octet bash state.
///
/// Lifecycle: `fresh` (just after [`Sponge::new`]) → `absorbing` (after any
/// [`Sponge::step_h`] call) → `finalized` (after [`Sponge::step_g`] or
/// [`Sponge::step_v`]). Calling `step_h` after finalization is a logic
/// error; in debug builds it panics, in release builds it is a no-op on an
/// already-finalized context (no secret-dependent branch is taken either
/// way — the flag check itself is the only branch).
#[derive(Clone)]
pub struct Sponge {
    state: [u8; STATE_BYTES],
    level: usize,
    rate: usize,
    pos: usize,
    finalized: bool,
    backend: BackendKind,
}

impl Sponge {
    /// Start a sponge context at security level `l` (bits), using the
    /// global default backend.
    ///
    /// # Errors
    /// Returns [`BashError::BadParam`] if `l` is not a positive multiple of
    /// 16 not exceeding 256.
    pub fn new(l: usize) -> Result<Self, BashError> {
        Self::new_with_backend(l, crate::engine::dispatcher::default_backend())
    }

    /// Start a sponge context at security level `l` (bits) with an
    /// explicitly chosen backend.
    ///
    /// # Errors
    /// Returns [`BashError::BadParam`] if `l` is not a positive multiple of
    /// 16 not exceeding 256.
    pub fn new_with_backend(l: usize, backend: BackendKind) -> Result<Self, BashError> {
        if !level_is_valid(l) {
            return Err(BashError::BadParam);
        }
        let mut state = [0u8; STATE_BYTES];
        // Domain-separation: the final octet of the state carries the
        // security level (in octets), so levels never collide.
        state[STATE_BYTES - 1] = (l / 8) as u8;
        Ok(Self {
            state,
            level: l,
            rate: rate_for_level(l),
            pos: 0,
            finalized: false,
            backend,
        })
    }

    /// Size in bytes of an opaque, stack-allocatable sponge context.
    #[must_use]
    pub const fn keep() -> usize {
        core::mem::size_of::<Self>()
    }

    /// Absorb a fragment of input.
    ///
    /// May be called zero or more times before finalization. Each call
    /// picks up exactly where the previous one left off.
    pub fn step_h(&mut self, mut data: &[u8]) {
        debug_assert!(!self.finalized, "step_h called after finalization");
        while !data.is_empty() {
            let take = (self.rate - self.pos).min(data.len());
            for (s, d) in self.state[self.pos..self.pos + take]
                .iter_mut()
                .zip(&data[..take])
            {
                *s ^= *d;
            }
            self.pos += take;
            data = &data[take..];
            if self.pos == self.rate {
                self.permute();
                self.pos = 0;
            }
        }
    }

    /// Squeeze the first `hash.len()` octets of the final hash value.
    ///
    /// Finalizes the context on first call (pads and permutes once); later
    /// calls continue squeezing from where the previous call left off, so
    /// that a long output can be drawn in pieces. `hash` and the internal
    /// state never actually alias in this implementation, but callers
    /// porting code from the reference library may rely on that property;
    /// it is preserved here for compatibility even though it isn't
    /// exercised.
    ///
    /// # Errors
    /// Returns [`BashError::BadParam`] if `hash.len() > level/4` octets.
    pub fn step_g(&mut self, hash: &mut [u8]) -> Result<(), BashError> {
        if hash.len() > capacity_for_level(self.level) {
            return Err(BashError::BadParam);
        }
        self.finalize_if_needed();
        let mut written = 0;
        while written < hash.len() {
            let avail = self.rate - self.pos;
            let take = avail.min(hash.len() - written);
            hash[written..written + take].copy_from_slice(&self.state[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
            if self.pos == self.rate && written < hash.len() {
                self.permute();
                self.pos = 0;
            }
        }
        Ok(())
    }

    /// Verify that the squeezed hash value matches `expected`, in constant
    /// time.
    ///
    /// # Errors
    /// Returns [`BashError::BadParam`] if `expected.len() > level/4`
    /// octets.
    pub fn step_v(&mut self, expected: &[u8]) -> Result<bool, BashError> {
        if expected.len() > MAX_HASH_LEN {
            return Err(BashError::BadParam);
        }
        let mut actual = [0u8; MAX_HASH_LEN];
        self.step_g(&mut actual[..expected.len()])?;
        Ok(bool::from(actual[..expected.len()].ct_eq(expected)))
    }

    fn finalize_if_needed(&mut self) {
        if !self.finalized {
            self.state[self.pos] ^= 0x40;
            self.permute();
            self.finalized = true;
            self.pos = 0;
        }
    }

    fn permute(&mut self) {
        self.backend.get().permute(&mut self.state);
    }
}

/// Name of the backend [`Sponge::new`] uses by default.
#[must_use]
pub fn default_backend() -> &'static str {
    default_backend_name()
}
