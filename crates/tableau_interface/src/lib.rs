//! Collaborator traits for the Tableau presentation runtime.
//!
//! The interpreter never touches storage, the network, a media device or
//! the submission gateway directly. It talks to these traits instead, so a
//! browser shell, a headless CLI and a test harness can each supply their
//! own implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod media;
mod storage;
mod submission;
mod transport;

pub use media::{AudioOutput, MediaPreloader, Playback};
pub use storage::BackingStore;
pub use submission::AssignmentSubmitter;
pub use transport::{DocumentFetcher, PathResolver};
