//! Persistence error types.

/// A backing-store write or read failure.
///
/// Persistence is best-effort: the state store logs these and keeps the
/// in-memory mutation.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Persistence Error: {} (key '{}') at line {} in {}", message, key, line, file)]
pub struct PersistenceError {
    /// Storage key involved
    pub key: String,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl PersistenceError {
    /// Create a new PersistenceError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tableau_error::PersistenceError;
    ///
    /// let err = PersistenceError::new("sim:score", "disk full");
    /// assert_eq!(err.key, "sim:score");
    /// ```
    #[track_caller]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            key: key.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
