//! Runtime configuration.
//!
//! The configuration system layers:
//! - Bundled defaults (`include_str!` from `tableau.toml`)
//! - `~/.config/tableau/tableau.toml`
//! - `./tableau.toml` (highest precedence)

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tableau_error::{ConfigError, TableauResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tableau.toml");

/// Runtime configuration.
///
/// # Example
///
/// ```
/// use tableau_core::TableauConfigBuilder;
///
/// let config = TableauConfigBuilder::default()
///     .content_base("https://cdn.example.com/modules")
///     .module_id("electro")
///     .build()
///     .unwrap();
/// assert_eq!(config.storage_namespace(), "simulator_state_electro");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into))]
pub struct TableauConfig {
    /// Absolute base URL content is served from
    content_base: String,
    /// Module id
    #[serde(default = "default_module_id")]
    #[builder(default = "default_module_id()")]
    module_id: String,
    /// Directory for the file-backed long-lived store
    #[serde(default = "default_storage_dir")]
    #[builder(default = "default_storage_dir()")]
    storage_dir: String,
    /// Image preload timeout (none waits indefinitely)
    #[serde(default)]
    #[builder(default)]
    image_timeout_ms: Option<u64>,
    /// Audio preload timeout
    #[serde(default = "default_audio_timeout")]
    #[builder(default = "default_audio_timeout()")]
    audio_timeout_ms: u64,
    /// Video preload timeout
    #[serde(default = "default_video_timeout")]
    #[builder(default = "default_video_timeout()")]
    video_timeout_ms: u64,
    /// Delay before a ready scene reports "not loading"
    #[serde(default = "default_settle_delay")]
    #[builder(default = "default_settle_delay()")]
    settle_delay_ms: u64,
    /// `wait` fallback delay
    #[serde(default = "default_wait")]
    #[builder(default = "default_wait()")]
    default_wait_ms: u64,
    /// Video sources that are not preloaded
    #[serde(default = "default_remote_video_patterns")]
    #[builder(default = "default_remote_video_patterns()")]
    remote_video_patterns: Vec<String>,
}

fn default_module_id() -> String {
    "default".to_string()
}

fn default_storage_dir() -> String {
    ".tableau".to_string()
}

fn default_audio_timeout() -> u64 {
    10_000
}

fn default_video_timeout() -> u64 {
    15_000
}

fn default_settle_delay() -> u64 {
    200
}

fn default_wait() -> u64 {
    1_000
}

fn default_remote_video_patterns() -> Vec<String> {
    vec!["drive.google.com".to_string(), "preview".to_string()]
}

impl TableauConfig {
    /// Loads configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file is malformed.
    #[instrument]
    pub fn load() -> TableauResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tableau/tableau.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("tableau").required(false));

        Self::from_builder(builder)
    }

    /// Loads bundled defaults overlaid with one explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> TableauResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()).required(true));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> TableauResult<Self> {
        Ok(builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?)
    }

    /// Key prefix for persisted state.
    pub fn storage_namespace(&self) -> String {
        format!("simulator_state_{}", self.module_id)
    }

    /// Base URL relative paths resolve against (always ends with `/`).
    pub fn module_base_url(&self) -> String {
        format!("{}/{}/", self.content_base.trim_end_matches('/'), self.module_id)
    }

    /// Audio preload timeout.
    pub fn audio_timeout(&self) -> Duration {
        Duration::from_millis(self.audio_timeout_ms)
    }

    /// Video preload timeout.
    pub fn video_timeout(&self) -> Duration {
        Duration::from_millis(self.video_timeout_ms)
    }

    /// Image preload timeout.
    pub fn image_timeout(&self) -> Option<Duration> {
        self.image_timeout_ms.map(Duration::from_millis)
    }

    /// Settle delay.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let config = TableauConfig::from_builder(
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
        )
        .unwrap();
        assert_eq!(config.module_id(), "default");
        assert_eq!(*config.audio_timeout_ms(), 10_000);
        assert_eq!(*config.video_timeout_ms(), 15_000);
        assert_eq!(*config.settle_delay_ms(), 200);
        assert_eq!(config.remote_video_patterns().len(), 2);
    }

    #[test]
    fn test_module_base_url_normalizes_slash() {
        let config = TableauConfigBuilder::default()
            .content_base("https://cdn.example.com/sims/")
            .module_id("electro")
            .build()
            .unwrap();
        assert_eq!(config.module_base_url(), "https://cdn.example.com/sims/electro/");
    }

    #[test]
    fn test_load_from_overlays_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tableau.toml");
        std::fs::write(&path, "module_id = \"electro\"\naudio_timeout_ms = 500\n").unwrap();

        let config = TableauConfig::load_from(&path).unwrap();
        assert_eq!(config.module_id(), "electro");
        assert_eq!(config.audio_timeout(), Duration::from_millis(500));
        assert_eq!(*config.video_timeout_ms(), 15_000);
        assert_eq!(config.storage_namespace(), "simulator_state_electro");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TableauConfig::load_from(dir.path().join("absent.toml")).is_err());
    }
}
