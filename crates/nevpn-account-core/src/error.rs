//! Error types for the account core.

use thiserror::Error;

/// Errors that can occur while building or decoding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("unsupported schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("table key {key} does not match record email {email}")]
    KeyMismatch { key: String, email: String },

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Schema(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
