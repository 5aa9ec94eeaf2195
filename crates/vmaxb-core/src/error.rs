//! Error types for the decoder.

use thiserror::Error;

/// Decoder-wide error type.
///
/// Only conditions that invalidate a whole document surface as errors.
/// Per-record problems are skipped and reported alongside the result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required key is absent
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// A node exists but has the wrong type
    #[error("Unexpected node at {path}: expected {expected}, found {found}")]
    UnexpectedNode {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
