//! Crash-safe persistence of the paper trading engine state.
//!
//! The full [`tradesmart_core::EngineState`] is one JSON document. Saves
//! go through a sibling temp file plus an atomic rename, so a crash at
//! any point leaves the previous good file intact. A file that fails to
//! parse is backed up under a timestamped name and replaced with a fresh
//! default state rather than taking the process down.

pub mod error;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use store::StateStore;
