//! Module manifest error types.

/// Specific error conditions for the module manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ManifestErrorKind {
    /// Manifest could not be fetched
    #[display("Could not fetch manifest: {}", _0)]
    Fetch(String),
    /// Server returned HTML instead of YAML
    #[display("Server returned HTML instead of YAML: {}", _0)]
    WrongContentType(String),
    /// YAML syntax error
    #[display("Invalid YAML in manifest '{}': {}", url, message)]
    Parse {
        /// Source URL
        url: String,
        /// Parser message
        message: String,
    },
    /// Manifest is empty or not a mapping
    #[display("Manifest is empty or invalid: {}", _0)]
    Empty(String),
    /// The `meta` section is absent
    #[display("Manifest has no \"meta\" section: {}", _0)]
    MissingMeta(String),
    /// The `scenes` list is absent or not a list
    #[display("Manifest has no \"scenes\" list: {}", _0)]
    MissingScenes(String),
    /// `meta.startScene` names no declared scene
    #[display("startScene '{}' not found", _0)]
    UnknownStartScene(String),
    /// A `next` reference names no declared scene
    #[display("next scene '{}' not found", _0)]
    UnknownNextScene(String),
}

/// Error type for manifest operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Manifest Error: {} at line {} in {}", kind, line, file)]
pub struct ManifestError {
    /// The specific error condition
    pub kind: ManifestErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ManifestError {
    /// Create a new ManifestError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ManifestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
