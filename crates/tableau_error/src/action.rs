//! Action decoding and execution error types.

/// Specific error conditions for action instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ActionErrorKind {
    /// Value is neither an instruction string nor an object with `type`
    #[display("Malformed action: {}", _0)]
    Malformed(String),
    /// Instruction type is not part of the vocabulary
    #[display("Unrecognized action type '{}'", _0)]
    UnknownType(String),
    /// Instruction requires an argument that was not supplied
    #[display("Action '{}' requires {}", action, expected)]
    MissingArgument {
        /// Instruction type
        action: String,
        /// Description of the expected argument
        expected: String,
    },
    /// No submission collaborator is installed
    #[display("Submission not configured for assignment '{}'", _0)]
    SubmissionNotConfigured(String),
    /// Upload action carried no file handle
    #[display("No file attached to upload '{}'", _0)]
    MissingFile(String),
    /// Remote submission failed
    #[display("Submission failed: {}", _0)]
    SubmissionFailed(String),
    /// `call` named a command that is not registered
    #[display("Command '{}' is not registered", _0)]
    UnknownCommand(String),
}

/// Error type for action operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Action Error: {} at line {} in {}", kind, line, file)]
pub struct ActionError {
    /// The specific error condition
    pub kind: ActionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ActionError {
    /// Create a new ActionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ActionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
