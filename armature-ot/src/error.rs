//! Error types for the OT engine

use thiserror::Error;
use uuid::Uuid;

/// OT engine error types
#[derive(Error, Debug)]
pub enum OtError {
    /// Operation is malformed for the document it targets
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation range falls outside the document
    #[error(
        "Operation out of bounds: position {position}, length {length}, content length {content_length}"
    )]
    OutOfBounds {
        /// Start offset of the operation
        position: usize,
        /// Number of chars the operation spans
        length: usize,
        /// Length of the content it was checked against
        content_length: usize,
    },

    /// No operation with this id is known
    #[error("Unknown operation: {0}")]
    UnknownOperation(Uuid),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for OtError {
    fn from(err: serde_json::Error) -> Self {
        OtError::Serialization(err.to_string())
    }
}

/// Result type for OT operations
pub type OtResult<T> = Result<T, OtError>;
