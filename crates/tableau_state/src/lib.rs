//! State store for the Tableau presentation runtime.
//!
//! [`StateStore`] owns the canonical runtime state and custom variables.
//! Every mutation goes through it so that change events fire and declared
//! keys are written to their persistence tier.
//!
//! Two [`BackingStore`](tableau_interface::BackingStore) implementations are
//! provided:
//!
//! - [`MemoryBackingStore`]: shared in-memory map, for tests and ephemeral sessions
//! - [`FileBackingStore`]: one JSON file per tier, for the headless runner

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backing;
mod persistence;
mod store;

pub use backing::{FileBackingStore, MemoryBackingStore};
pub use persistence::{DEFAULT_STATUS_KEY, DEFAULT_STATUS_VALUE, default_state, persistence_tier};
pub use store::StateStore;
