//! Module manifest retrieval.

use tableau_core::Manifest;
use tableau_error::{ManifestError, ManifestErrorKind};
use tableau_interface::DocumentFetcher;
use tracing::{info, instrument};

/// Fetches and validates the module manifest at `url`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be fetched, is an HTML page, is
/// not valid YAML, or lacks `meta` or a `scenes` list.
#[instrument(skip(fetcher))]
pub async fn load_manifest(
    fetcher: &dyn DocumentFetcher,
    url: &str,
) -> Result<Manifest, ManifestError> {
    let text = fetcher
        .fetch_text(url)
        .await
        .map_err(|e| ManifestError::new(ManifestErrorKind::Fetch(e.message())))?;
    let manifest = Manifest::from_yaml_str(&text, url)?;
    info!(scenes = manifest.scenes().len(), "Manifest loaded");
    Ok(manifest)
}
