//! Top-level error wrapper types.

use crate::{
    ActionError, ConfigError, ExpressionError, JsonError, ManifestError, PersistenceError,
    SceneError, SubmissionError,
};

/// Every error condition the runtime can surface.
///
/// # Examples
///
/// ```
/// use tableau_error::{TableauError, ConfigError};
///
/// let err: TableauError = ConfigError::new("bad base url").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TableauErrorKind {
    /// Scene document transport or parse error
    #[from(SceneError)]
    Scene(SceneError),
    /// Module manifest error
    #[from(ManifestError)]
    Manifest(ManifestError),
    /// Expression evaluation error
    #[from(ExpressionError)]
    Expression(ExpressionError),
    /// Instruction error
    #[from(ActionError)]
    Action(ActionError),
    /// Backing store failure
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Remote submission failure
    #[from(SubmissionError)]
    Submission(SubmissionError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Tableau error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tableau Error: {}", _0)]
pub struct TableauError(Box<TableauErrorKind>);

impl TableauError {
    /// Create a new error from a kind.
    pub fn new(kind: TableauErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TableauErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to TableauErrorKind
impl<T> From<T> for TableauError
where
    T: Into<TableauErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tableau operations.
pub type TableauResult<T> = std::result::Result<T, TableauError>;
