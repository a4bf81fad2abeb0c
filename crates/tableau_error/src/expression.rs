//! Expression evaluation error types.

/// Specific error conditions for expression lexing, parsing and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExpressionErrorKind {
    /// Unrecognized character sequence
    #[display("Unexpected input '{}' at offset {}", text, offset)]
    Lex {
        /// Offending text
        text: String,
        /// Byte offset in the expression
        offset: usize,
    },
    /// Token stream does not form an expression
    #[display("Parse error: {}", _0)]
    Parse(String),
    /// Expression ended early
    #[display("Unexpected end of expression")]
    UnexpectedEnd,
    /// Identifier is not defined in the evaluation context
    #[display("{} is not defined", _0)]
    UnknownIdentifier(String),
    /// Operation not valid for the operand types
    #[display("Type error: {}", _0)]
    Type(String),
    /// Call target is not a supported function
    #[display("{} is not a function", _0)]
    NotCallable(String),
}

/// Error type for expression evaluation.
///
/// # Examples
///
/// ```
/// use tableau_error::{ExpressionError, ExpressionErrorKind};
///
/// let err = ExpressionError::new(ExpressionErrorKind::UnknownIdentifier("score".into()));
/// assert!(format!("{}", err).contains("score is not defined"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Expression Error: {} at line {} in {}", kind, line, file)]
pub struct ExpressionError {
    /// The specific error condition
    pub kind: ExpressionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExpressionError {
    /// Create a new ExpressionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExpressionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
