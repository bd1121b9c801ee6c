//! Error types for conversion operations

use thiserror::Error;

/// Errors that can occur while turning markup into Markdown
///
/// The sanitize, unwrap, render and cleanup stages are total; only the parser
/// boundary and tree construction can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// Character encoding error
    #[error("Encoding error: {0}")]
    EncodingError(String),
    /// Invalid input data (empty markup, excessive nesting)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A tree handed over by the parser breaks the data model.
    ///
    /// This is a programmer error in the upstream collaborator, not a
    /// condition callers are expected to recover from.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
