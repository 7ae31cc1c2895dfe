//! Error types for the docflow-core library.

use thiserror::Error;

use crate::models::document::DocumentStatus;

/// Main error type for the docflow library.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document not found in the persistence layer.
    #[error("document not found: {0}")]
    NotFound(String),

    /// An illegal status transition was attempted. The document is left
    /// unchanged when this is returned.
    #[error("invalid document status transition from {from} to {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Binary content storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Text recognition error.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to binary content storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The referenced content does not exist in storage.
    #[error("file not found in storage: {0}")]
    NotFound(String),

    /// Empty content was offered for storage.
    #[error("file is empty or corrupted")]
    EmptyContent,

    /// Content exceeds the configured size limit.
    #[error("file size {size} exceeds maximum allowed size of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// Underlying filesystem error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the text recognition capability.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The engine was invoked with empty content, which the contract forbids.
    #[error("recognition invoked with empty content")]
    EmptyContent,

    /// The engine itself failed.
    #[error("recognition engine failed: {0}")]
    Engine(String),
}

/// Result type for the docflow library.
pub type Result<T> = std::result::Result<T, PipelineError>;
