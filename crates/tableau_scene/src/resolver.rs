//! Base-URL path resolution.

use reqwest::Url;
use tableau_core::TableauConfig;
use tableau_error::{SceneError, SceneErrorKind};
use tableau_interface::PathResolver;

/// Resolves references against a module base URL.
///
/// Absolute URLs pass through unchanged; relative ones are joined onto the
/// base, which always ends in `/`.
///
/// ```
/// use tableau_interface::PathResolver;
/// use tableau_scene::BaseUrlResolver;
///
/// let resolver = BaseUrlResolver::new("https://cdn.example.com/sims/electro").unwrap();
/// assert_eq!(
///     resolver.resolve("img/board.png").unwrap(),
///     "https://cdn.example.com/sims/electro/img/board.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlResolver {
    base: Url,
}

impl BaseUrlResolver {
    /// Resolver rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, SceneError> {
        let normalized = format!("{}/", base.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| {
            SceneError::new(SceneErrorKind::PathResolution {
                path: base.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(Self { base })
    }

    /// Resolver for `<content_base>/<module_id>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured content base is not an absolute URL.
    pub fn from_config(config: &TableauConfig) -> Result<Self, SceneError> {
        Self::new(&config.module_base_url())
    }

    /// Resolver rooted at a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not absolute.
    pub fn from_directory(dir: &std::path::Path) -> Result<Self, SceneError> {
        let base = Url::from_directory_path(dir).map_err(|()| {
            SceneError::new(SceneErrorKind::PathResolution {
                path: dir.display().to_string(),
                message: "not an absolute directory path".to_string(),
            })
        })?;
        Ok(Self { base })
    }

    /// The base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl PathResolver for BaseUrlResolver {
    fn resolve(&self, path: &str) -> Result<String, SceneError> {
        self.base
            .join(path.trim())
            .map(String::from)
            .map_err(|e| {
                SceneError::new(SceneErrorKind::PathResolution {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls_pass_through() {
        let resolver = BaseUrlResolver::new("https://cdn.example.com/sims/a/").unwrap();
        assert_eq!(
            resolver.resolve("https://other.example.com/v.mp4").unwrap(),
            "https://other.example.com/v.mp4"
        );
        assert_eq!(
            resolver.resolve("../shared/logo.png").unwrap(),
            "https://cdn.example.com/sims/shared/logo.png"
        );
    }

    #[test]
    fn test_relative_base_is_rejected() {
        assert!(BaseUrlResolver::new("sims/a").is_err());
    }
}
