//! Error types for snap2cook

use thiserror::Error;

/// Unified error type for snap2cook operations
#[derive(Debug, Error)]
pub enum Snap2CookError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code, with the response body when one was sent
    #[error("HTTP error: {status} {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A collaborator was called without its API key configured
    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
    /// A collaborator answered, but not with the shape we asked for
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Short alias used throughout the crate
pub type Error = Snap2CookError;

/// Result alias for snap2cook operations
pub type Result<T> = std::result::Result<T, Snap2CookError>;
