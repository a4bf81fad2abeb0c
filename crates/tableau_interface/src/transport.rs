//! Document retrieval and asset path resolution.

use async_trait::async_trait;
use tableau_error::SceneError;

/// Turns a relative asset or document reference into a retrievable URL.
///
/// Implementations must be pure: the same input always yields the same URL.
pub trait PathResolver: Send + Sync {
    /// Absolute URL for `path`.
    fn resolve(&self, path: &str) -> Result<String, SceneError>;
}

/// Fetches a document body as text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Body of the document at `url`.
    ///
    /// Transport failures and non-success statuses are errors; content
    /// sniffing is left to the caller.
    async fn fetch_text(&self, url: &str) -> Result<String, SceneError>;
}
