//! Permutation backend selection.

pub mod dispatcher;

pub use dispatcher::{default_backend_name, Backend, BackendKind};
