//! Error taxonomy for the block parser
//!
//! Extractors and the recovery engine speak [`ParseError`]. The variants fall into
//! three groups:
//!
//! | Variant | Handling |
//! |---------|----------|
//! | `NotApplicable` | line miss, the engine moves to the next line of the same block |
//! | `Response` | block-fatal, the engine skips one whole block forward |
//! | everything else | surfaces to the caller of the query |
//!
//! The binary and file loaders wrap these in `anyhow::Error` at the boundary.

use thiserror::Error;

/// Result alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The line does not carry what the extractor is looking for
    #[error("line is not a {0}")]
    NotApplicable(&'static str),

    /// A decoded response reported an upstream failure
    #[error("response error: {message}")]
    Response { message: String },

    /// Scanning ran past the oldest line of the log
    #[error("Ran out of logs.")]
    NoLogs,

    /// A whole block was scanned without the extractor matching any line
    #[error("no {what} found in block starting at line {start}")]
    NotFoundInBlock { what: &'static str, start: usize },

    /// No delimiter line between the given index and the newest line
    #[error("no block delimiter at or before line {index}")]
    NoDelimiter { index: usize },

    /// A quantity line whose payload has an unexpected shape
    #[error("malformed quantity line {index}: {line:?}")]
    MalformedQuantity { index: usize, line: String },

    /// The normalized date string could not be parsed
    #[error("invalid date {value:?}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A configured tag produced an unusable match pattern
    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ParseError {
    /// Recoverable within the current block
    pub fn is_line_miss(&self) -> bool {
        matches!(self, ParseError::NotApplicable(_))
    }

    /// Abandons the current block
    pub fn is_block_fatal(&self) -> bool {
        matches!(self, ParseError::Response { .. })
    }
}
