//! Error types for the Tableau presentation runtime.
//!
//! This crate provides the foundation error types used throughout the Tableau workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tableau_error::{TableauResult, SceneError, SceneErrorKind};
//!
//! fn fetch_scene() -> TableauResult<String> {
//!     Err(SceneError::new(SceneErrorKind::Other("connection refused".into())))?
//! }
//!
//! match fetch_scene() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod error;
mod expression;
mod json;
mod manifest;
mod persistence;
mod scene;
mod submission;

pub use action::{ActionError, ActionErrorKind};
pub use config::ConfigError;
pub use error::{TableauError, TableauErrorKind, TableauResult};
pub use expression::{ExpressionError, ExpressionErrorKind};
pub use json::JsonError;
pub use manifest::{ManifestError, ManifestErrorKind};
pub use persistence::PersistenceError;
pub use scene::{SceneError, SceneErrorKind};
pub use submission::SubmissionError;
