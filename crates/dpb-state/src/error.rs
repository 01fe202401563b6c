//! Error types for checkpoint state operations.

use thiserror::Error;

/// Errors that can occur while encoding or decoding bundle state.
#[derive(Error, Debug)]
pub enum StateError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checksum verification failed
    #[error("checksum mismatch for nested state {index}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// Unknown or unsupported state version
    #[error("unsupported state version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Structurally invalid state
    #[error("corrupted state: {0}")]
    CorruptedState(String),
}

/// Result type alias for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
