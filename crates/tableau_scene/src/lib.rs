//! Scene loading for the Tableau presentation runtime.
//!
//! [`SceneLoader`] turns a scene file name into a ready [`Scene`](tableau_core::Scene):
//! fetch, HTML sniffing, YAML parsing, asset extraction and preloading with
//! progress, in that order. Starting a new load supersedes the one in
//! flight; superseded results are dropped.
//!
//! Transport implementations:
//!
//! - [`HttpFetcher`] / [`FileFetcher`]: [`DocumentFetcher`](tableau_interface::DocumentFetcher) over HTTP or `file://`
//! - [`BaseUrlResolver`]: [`PathResolver`](tableau_interface::PathResolver) joining against a module base URL
//! - [`UrlPreloader`]: [`MediaPreloader`](tableau_interface::MediaPreloader) that downloads assets

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod document;
mod fetch;
mod loader;
mod manifest;
mod preload;
mod resolver;

pub use assets::{ExtractedAssets, extract_assets};
pub use document::parse_scene_document;
pub use fetch::{FileFetcher, HttpFetcher};
pub use loader::{LoadPhase, LoadStatus, PreloadTimeouts, SceneLoader};
pub use manifest::load_manifest;
pub use preload::UrlPreloader;
pub use resolver::BaseUrlResolver;
