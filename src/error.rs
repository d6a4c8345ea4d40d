//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.
//!
//! Only failures that prevent building a document at all are errors. Problems
//! inside a well-formed OpenAPI document are diagnostics in a
//! [`ValidationReport`](crate::oas::report::ValidationReport).

use crate::loader::SourceFormat;
use crate::oas::report::ValidationReport;
use derive_more::{Display, From};
use std::fmt;

/// The Global Error Enum.
///
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// The input text is not valid JSON or YAML.
    #[display("Syntax Error: {_0}")]
    Syntax(SyntaxError),

    /// The input parsed, but does not form a usable document tree.
    #[from(ignore)]
    #[display("Structure Error: {_0}")]
    Structure(String),

    /// The document declares a missing or unsupported OpenAPI version.
    #[from(ignore)]
    #[display("Unsupported Document: {_0}")]
    Unsupported(String),

    /// Strict mode rejected the document because its report failed.
    #[display("Validation Failed:\n{_0}")]
    Validation(ValidationReport),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// A lexical failure reported by the JSON or YAML parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Format the text was parsed as.
    pub format: SourceFormat,
    /// One-based line, when the parser reports one.
    pub line: Option<usize>,
    /// One-based column, when the parser reports one.
    pub column: Option<usize>,
    /// Parser message.
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(format: SourceFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub(crate) fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(
                f,
                "{} at line {}, column {}: {}",
                self.format, line, column, self.message
            ),
            _ => write!(f, "{}: {}", self.format, self.message),
        }
    }
}
