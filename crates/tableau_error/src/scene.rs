//! Scene loading error types.

/// Specific error conditions while loading a scene document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SceneErrorKind {
    /// Transport failure before a response arrived
    #[display("Could not fetch '{}': {}", url, message)]
    Network {
        /// Requested URL
        url: String,
        /// Transport error message
        message: String,
    },
    /// Server answered with a non-success status
    #[display("HTTP {} while fetching '{}'", status, url)]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },
    /// Server returned an HTML page instead of a YAML document
    #[display("Server returned HTML instead of YAML: {}", _0)]
    WrongContentType(String),
    /// Document is not valid YAML or does not match the scene shape
    #[display("Invalid scene YAML in '{}': {}", url, message)]
    Parse {
        /// Source URL or file
        url: String,
        /// Parser message
        message: String,
    },
    /// Document parsed but carried no scene payload
    #[display("Scene document is empty: {}", _0)]
    EmptyDocument(String),
    /// An asset failed to preload in a way that aborts the load
    #[display("Failed to load asset '{}': {}", src, message)]
    Asset {
        /// Resolved asset URL
        src: String,
        /// Error message
        message: String,
    },
    /// Asset reference could not be resolved to an absolute URL
    #[display("Cannot resolve asset path '{}': {}", path, message)]
    PathResolution {
        /// Relative path
        path: String,
        /// Error message
        message: String,
    },
    /// Load was superseded by a newer request
    #[display("Load of '{}' was superseded", _0)]
    Cancelled(String),
    /// Network fetch failed (generic)
    #[display("Network error: {}", _0)]
    Other(String),
}

/// Error type for scene loading.
///
/// # Examples
///
/// ```
/// use tableau_error::{SceneError, SceneErrorKind};
///
/// let err = SceneError::new(SceneErrorKind::WrongContentType("intro.yaml".into()));
/// assert!(format!("{}", err).contains("HTML"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Scene Error: {} at line {} in {}", kind, line, file)]
pub struct SceneError {
    /// The specific error condition
    pub kind: SceneErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SceneError {
    /// Create a new SceneError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SceneErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Human-readable message without the location suffix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}
