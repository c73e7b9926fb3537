//! The REST seam consumed by the appliers.
//!
//! `RepoApi` is deliberately tiny: the appliers only ever read one
//! collection (branches) and mutate two resources (settings, property
//! values). A real implementation lives in [`crate::client`]; an in-memory
//! recorder for tests lives in [`crate::fakes`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// HTTP response as seen by callers: status plus decoded body.
///
/// Non-2xx statuses are not errors at this layer; callers decide which
/// status means success for the endpoint they hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Decode a raw response body.
    ///
    /// Empty bodies become `null`; bodies that are not JSON are kept as a
    /// JSON string so they can still be logged.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self { status, body }
    }

    pub fn is_status(&self, expected: u16) -> bool {
        self.status == expected
    }

    /// Body rendered for log lines.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Authenticated access to the repository REST surface.
///
/// `path` is always relative to the API root and starts with `/`,
/// e.g. `/repos/acme/widget`.
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, path: &str) -> ClientResult<ApiResponse>;

    /// Issue a PATCH request with a JSON body.
    async fn patch(&self, path: &str, body: &Value) -> ClientResult<ApiResponse>;
}
