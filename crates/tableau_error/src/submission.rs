//! Remote submission error types.

/// Failure reported by the submission collaborator.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Submission Error: assignment '{}': {} at line {} in {}", assignment_id, message, line, file)]
pub struct SubmissionError {
    /// Assignment the submission targeted
    pub assignment_id: String,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl SubmissionError {
    /// Create a new SubmissionError at the current location.
    #[track_caller]
    pub fn new(assignment_id: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            assignment_id: assignment_id.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
