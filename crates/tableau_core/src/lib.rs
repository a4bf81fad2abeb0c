//! Core data types for the Tableau presentation runtime.
//!
//! This crate provides the shared vocabulary used by every other Tableau crate:
//!
//! - **Scene model**: scenes, slides, nested elements and asset catalogs parsed from YAML
//! - **Actions**: the textual/structured instruction grammar and its typed decoding
//! - **Event bus**: synchronous publish/subscribe keyed by event name
//! - **Manifest**: the module-level document used to pick the initial scene
//! - **Configuration**: layered `tableau.toml` loading
//!
//! # Example
//!
//! ```rust
//! use tableau_core::{Action, RawAction};
//!
//! let raw = RawAction::from("goto_id:summary");
//! let action = Action::decode(&raw).unwrap();
//! assert_eq!(action, Action::GotoId("summary".to_string()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod events;
mod manifest;
mod scene;
mod telemetry;
mod tier;
pub mod value;

pub use action::{Action, ActionList, RawAction, SubmissionFile, UploadRequest};
pub use config::{TableauConfig, TableauConfigBuilder};
pub use events::{EventBus, EventCallback, Subscription};
pub use manifest::{Manifest, ManifestMeta, ManifestScene};
pub use scene::{
    AssetCatalog, AssetEntry, Element, EventBinding, Scene, SceneMeta, Slide, looks_like_html,
};
pub use telemetry::init_tracing;
pub use tier::PersistenceTier;
