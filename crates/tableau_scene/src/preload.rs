//! Download-based media preloading.

use crate::FileFetcher;
use async_trait::async_trait;
use tableau_error::{SceneError, SceneErrorKind};
use tableau_interface::MediaPreloader;
use tracing::{debug, instrument};

/// Preloads assets by downloading them in full.
///
/// HTTP(S) URLs are fetched with `reqwest`; `file://` URLs are checked for
/// existence. There is no decoding, so "ready" means "bytes are reachable".
#[derive(Debug, Clone, Default)]
pub struct UrlPreloader {
    client: reqwest::Client,
}

impl UrlPreloader {
    /// Preloader with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    async fn warm(&self, url: &str) -> Result<(), SceneError> {
        let asset_error = |message: String| {
            SceneError::new(SceneErrorKind::Asset {
                src: url.to_string(),
                message,
            })
        };

        if url.starts_with("file:") {
            return FileFetcher::default()
                .check_exists(url)
                .await
                .map_err(|e| asset_error(e.message()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| asset_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(asset_error(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| asset_error(e.to_string()))?;
        debug!(bytes = bytes.len(), "Asset downloaded");
        Ok(())
    }
}

#[async_trait]
impl MediaPreloader for UrlPreloader {
    #[instrument(skip(self))]
    async fn preload_image(&self, url: &str) -> Result<(), SceneError> {
        self.warm(url).await
    }

    #[instrument(skip(self))]
    async fn preload_audio(&self, url: &str) -> Result<(), SceneError> {
        self.warm(url).await
    }

    #[instrument(skip(self))]
    async fn preload_video(&self, url: &str) -> Result<(), SceneError> {
        self.warm(url).await
    }
}
