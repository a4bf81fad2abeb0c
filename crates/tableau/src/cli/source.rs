//! Where a module's documents come from.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tableau::{
    BaseUrlResolver, ConfigError, DocumentFetcher, FileFetcher, HttpFetcher, PathResolver,
    TableauConfig, TableauResult,
};
use tracing::debug;

/// File name looked up when a source names a directory.
const MANIFEST_FILE: &str = "manifest.yaml";

/// Fetcher and resolver for one module, plus the manifest location.
///
/// A source is an `http(s)` manifest URL, a local manifest file or a local
/// module directory. Without a source the configured module is used.
pub struct ModuleSource {
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub resolver: Arc<BaseUrlResolver>,
    pub manifest_url: String,
}

impl ModuleSource {
    pub fn open(source: Option<&str>, config: &TableauConfig) -> TableauResult<Self> {
        let module = match source {
            None => {
                let resolver = BaseUrlResolver::from_config(config)?;
                Self::remote(resolver, MANIFEST_FILE)?
            }
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                let (base, file) = url.rsplit_once('/').unwrap_or((url, MANIFEST_FILE));
                let file = if file.is_empty() { MANIFEST_FILE } else { file };
                Self::remote(BaseUrlResolver::new(base)?, file)?
            }
            Some(path) => Self::local(Path::new(path))?,
        };
        debug!(manifest = %module.manifest_url, "Opened module source");
        Ok(module)
    }

    fn remote(resolver: BaseUrlResolver, manifest: &str) -> TableauResult<Self> {
        let manifest_url = resolver.resolve(manifest)?;
        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new()),
            resolver: Arc::new(resolver),
            manifest_url,
        })
    }

    fn local(path: &Path) -> TableauResult<Self> {
        let path = std::path::absolute(path).map_err(|e| {
            ConfigError::new(format!("Cannot resolve '{}': {}", path.display(), e))
        })?;
        let (dir, manifest): (PathBuf, String) = if path.is_dir() {
            (path, MANIFEST_FILE.to_string())
        } else {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| MANIFEST_FILE.to_string());
            (dir, file)
        };

        let resolver = BaseUrlResolver::from_directory(&dir)?;
        let manifest_url = resolver.resolve(&manifest)?;
        Ok(Self {
            fetcher: Arc::new(FileFetcher::new(dir)),
            resolver: Arc::new(resolver),
            manifest_url,
        })
    }
}
