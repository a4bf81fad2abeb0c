//! Tableau - interactive scene and slide presentation runtime
//!
//! Tableau runs presentations authored as YAML scene documents: ordered
//! slides of elements, named media assets, and a small action language
//! (`next_slide`, `set:score:+1`, `if`, `upload_file`, ...) executed against a
//! persistent state store.
//!
//! # Features
//!
//! - **State store**: namespaced state with a session tier and a long-lived
//!   tier, hydrated on load and written back on every change
//! - **Event bus**: named events with synchronous fan-out
//! - **Expressions**: `visible_if` conditions and `{{ }}` interpolation over
//!   a sandboxed expression language
//! - **Scene loader**: fetch, parse and asset preload with progress events
//!   and cancellation of superseded loads
//! - **Action engine**: navigation, media, timers, visibility overrides,
//!   custom variables, command calls and remote submission
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tableau::{
//!     ActionEngine, BaseUrlResolver, EventBus, HttpFetcher, MemoryBackingStore, SceneLoader,
//!     Session, StateStore, TableauConfig, UrlPreloader,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TableauConfig::load()?;
//!     let bus = EventBus::new();
//!     let store = Arc::new(StateStore::load(
//!         config.storage_namespace(),
//!         bus.clone(),
//!         Arc::new(MemoryBackingStore::new("session")),
//!         Arc::new(MemoryBackingStore::new("local")),
//!     ));
//!     let resolver = Arc::new(BaseUrlResolver::from_config(&config)?);
//!     let loader = SceneLoader::from_config(
//!         Arc::new(HttpFetcher::new()),
//!         resolver.clone(),
//!         Arc::new(UrlPreloader::new()),
//!         bus,
//!         &config,
//!     );
//!     let engine = Arc::new(ActionEngine::new(store.clone()).with_resolver(resolver));
//!
//!     let session = Session::start(store, loader, engine)?;
//!     session.open_scene("intro.yaml");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Tableau is organized as a workspace with focused crates:
//!
//! - `tableau_error` - Error types
//! - `tableau_core` - Scene model, action grammar, event bus, configuration
//! - `tableau_interface` - Backing store, transport, media and submission traits
//! - `tableau_state` - State store and backing stores
//! - `tableau_expression` - Expression language and interpolation
//! - `tableau_scene` - Scene loading, asset extraction and preload
//! - `tableau_engine` - Action engine, visibility and scene event bindings
//!
//! This crate (`tableau`) re-exports everything and adds [`Session`], which
//! wires the pieces into a running presentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod session;

pub use session::Session;

// Error types
pub use tableau_error::{
    ActionError, ActionErrorKind, ConfigError, ExpressionError, ExpressionErrorKind, JsonError,
    ManifestError, ManifestErrorKind, PersistenceError, SceneError, SceneErrorKind,
    SubmissionError, TableauError, TableauErrorKind, TableauResult,
};

// Core model
pub use tableau_core::{
    Action, ActionList, AssetCatalog, AssetEntry, Element, EventBinding, EventBus, Manifest,
    ManifestMeta, ManifestScene, PersistenceTier, RawAction, Scene, SceneMeta, Slide,
    SubmissionFile, Subscription, TableauConfig, TableauConfigBuilder, UploadRequest,
    init_tracing,
};

// Traits
pub use tableau_interface::{
    AssignmentSubmitter, AudioOutput, BackingStore, DocumentFetcher, MediaPreloader,
    PathResolver, Playback,
};

// State
pub use tableau_state::{
    DEFAULT_STATUS_KEY, DEFAULT_STATUS_VALUE, FileBackingStore, MemoryBackingStore, StateStore,
};

// Expressions
pub use tableau_expression::{Context, evaluate, evaluate_condition, interpolate};

// Scene loading
pub use tableau_scene::{
    BaseUrlResolver, ExtractedAssets, FileFetcher, HttpFetcher, LoadPhase, LoadStatus,
    PreloadTimeouts, SceneLoader, UrlPreloader, extract_assets, load_manifest,
    parse_scene_document,
};

// Engine
pub use tableau_engine::{
    ActionEngine, CommandTable, SceneEventBindings, SilentAudioOutput, Triggered,
    apply_visibility,
};
