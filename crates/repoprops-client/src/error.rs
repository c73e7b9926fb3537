//! Error types for repoprops-client

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the REST API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connectivity, TLS handshake or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Trust root could not be read or parsed
    #[error("Invalid certificate at {path:?}: {reason}")]
    Certificate { path: PathBuf, reason: String },

    /// Token contains characters that cannot go into a header
    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// JSON encoding error
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::Build(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
