//! Document fetchers.

use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use tableau_error::{SceneError, SceneErrorKind};
use tableau_interface::DocumentFetcher;
use tracing::{debug, error, instrument};

/// Fetches documents over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, SceneError> {
        debug!("Fetching document");
        let response = self
            .client
            .get(url)
            .header("Accept", "text/yaml, text/plain, */*")
            .send()
            .await
            .map_err(|e| {
                error!("Request failed: {}", e);
                SceneError::new(SceneErrorKind::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            error!(status, "Server returned error");
            return Err(SceneError::new(SceneErrorKind::HttpStatus {
                url: url.to_string(),
                status,
            }));
        }

        response.text().await.map_err(|e| {
            SceneError::new(SceneErrorKind::Network {
                url: url.to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Reads documents from disk.
///
/// Accepts `file://` URLs and plain paths; relative paths are taken from
/// `root`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Fetcher resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, location: &str) -> Result<PathBuf, SceneError> {
        if location.starts_with("file:") {
            let url = Url::parse(location).map_err(|e| {
                SceneError::new(SceneErrorKind::PathResolution {
                    path: location.to_string(),
                    message: e.to_string(),
                })
            })?;
            url.to_file_path().map_err(|()| {
                SceneError::new(SceneErrorKind::PathResolution {
                    path: location.to_string(),
                    message: "not a local file URL".to_string(),
                })
            })
        } else {
            Ok(self.root.join(location))
        }
    }

    /// Succeeds when `location` names an existing file.
    pub(crate) async fn check_exists(&self, location: &str) -> Result<(), SceneError> {
        let path = self.path_for(location)?;
        tokio::fs::metadata(&path).await.map(|_| ()).map_err(|e| {
            SceneError::new(SceneErrorKind::Network {
                url: location.to_string(),
                message: e.to_string(),
            })
        })
    }
}

#[async_trait]
impl DocumentFetcher for FileFetcher {
    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, SceneError> {
        let path = self.path_for(url)?;
        debug!(path = %path.display(), "Reading document");
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            SceneError::new(SceneErrorKind::Network {
                url: url.to_string(),
                message: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_fetcher_reads_relative_and_url_forms() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("intro.yaml"), "slides: []").unwrap();
        let fetcher = FileFetcher::new(dir.path());

        assert_eq!(fetcher.fetch_text("intro.yaml").await.unwrap(), "slides: []");

        let url = Url::from_file_path(dir.path().join("intro.yaml")).unwrap();
        assert_eq!(fetcher.fetch_text(url.as_str()).await.unwrap(), "slides: []");

        let err = fetcher.fetch_text("missing.yaml").await.unwrap_err();
        assert!(matches!(err.kind, SceneErrorKind::Network { .. }));
    }
}
