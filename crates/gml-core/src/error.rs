//! Error types for the parsing pipeline

use gml_grammar::RecognitionError;
use serde::Serialize;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Syntax(SyntaxError),

    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("contract violation: {0}")]
    Contract(String),

    #[error("malformed parse tree: {0}")]
    MalformedTree(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Programmer errors: wrong option types and broken collaborator
    /// contracts. These are never retried or reported as syntax errors.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOption { .. } | Error::Contract(_) | Error::MalformedTree(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

/// A parse failure as reported to callers.
///
/// `line` is 1-based and `column` is the 0-based character offset within the
/// line, as the grammar engine reports them. An error with no position at all
/// falls back to the fixed `1:1`, which is not shifted into that space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub const UNKNOWN: &'static str = "Unknown parse error";

    /// Classify a grammar engine error. Position comes from the error's own
    /// fields, then from the offending token, then defaults to 1:1.
    pub fn classify(error: &RecognitionError) -> Self {
        let token = error.token.as_ref();

        let line = error.line.or(token.map(|t| t.line)).unwrap_or(1);
        let column = error.column.or(token.map(|t| t.column)).unwrap_or(1);
        let message = if error.message.trim().is_empty() {
            Self::UNKNOWN.to_string()
        } else {
            error.message.clone()
        };

        Self {
            message,
            line,
            column,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax Error (line {}, column {}): {}",
            self.line, self.column, self.message
        )
    }
}

impl From<&RecognitionError> for SyntaxError {
    fn from(error: &RecognitionError) -> Self {
        Self::classify(error)
    }
}
