//! Unified error handling for the Dify client.
//!
//! The taxonomy is split by domain:
//!
//! - **`ApiError`** — errors the service reports: status-code bands,
//!   quota exhaustion, local validation.
//! - **`StreamError`** — SSE protocol failures: malformed payloads,
//!   per-event timeouts, lost connections.
//! - **`ConfigError`** (in `crate::config`) — configuration loading.
//!
//! `DifyError` consolidates them, together with transport and decoding
//! errors from the underlying crates, so callers can hold one error type.
//! Every error exposes `is_retryable()`, `user_message()`, and
//! `error_code()` for consistent handling and logging.

mod api;
mod stream;

pub use api::{ApiError, ResourceKind};
pub use stream::StreamError;

use std::fmt;

use crate::config::ConfigError;

/// Unified error type for all client operations.
#[derive(Debug)]
pub enum DifyError {
    /// Error reported by the Dify API.
    Api(ApiError),

    /// SSE stream processing error.
    Stream(StreamError),

    /// Configuration loading error.
    Config(ConfigError),

    /// HTTP transport error.
    Http(reqwest::Error),

    /// JSON encoding/decoding error outside the SSE path.
    Json(serde_json::Error),

    /// Local filesystem error (export/import artifacts).
    Io(std::io::Error),
}

impl DifyError {
    /// Retarget an API `NotFound` at a specific resource kind; other
    /// errors pass through unchanged.
    pub fn for_resource(self, resource: ResourceKind) -> Self {
        match self {
            DifyError::Api(err) => DifyError::Api(err.for_resource(resource)),
            other => other,
        }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            DifyError::Api(err) => err.is_retryable(),
            DifyError::Stream(err) => err.is_retryable(),
            DifyError::Config(_) => false,
            DifyError::Http(err) => err.is_timeout() || err.is_connect(),
            DifyError::Json(_) => false,
            DifyError::Io(_) => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            DifyError::Api(err) => err.user_message(),
            DifyError::Stream(err) => err.user_message(),
            DifyError::Config(err) => err.to_string(),
            DifyError::Http(err) => {
                if err.is_timeout() {
                    "The request timed out. Check your connection and try again.".to_string()
                } else if err.is_connect() {
                    "Could not reach the server. Check the base URL and your connection."
                        .to_string()
                } else {
                    format!("HTTP error: {}", err)
                }
            }
            DifyError::Json(err) => format!("Failed to decode response: {}", err),
            DifyError::Io(err) => format!("File error: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            DifyError::Api(err) => err.error_code(),
            DifyError::Stream(err) => err.error_code(),
            DifyError::Config(_) => "E_CONFIG",
            DifyError::Http(_) => "E_HTTP",
            DifyError::Json(_) => "E_JSON",
            DifyError::Io(_) => "E_IO",
        }
    }
}

impl fmt::Display for DifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifyError::Api(err) => write!(f, "{}", err),
            DifyError::Stream(err) => write!(f, "{}", err),
            DifyError::Config(err) => write!(f, "{}", err),
            DifyError::Http(err) => write!(f, "HTTP error: {}", err),
            DifyError::Json(err) => write!(f, "JSON error: {}", err),
            DifyError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for DifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DifyError::Api(err) => Some(err),
            DifyError::Stream(err) => Some(err),
            DifyError::Config(err) => Some(err),
            DifyError::Http(err) => Some(err),
            DifyError::Json(err) => Some(err),
            DifyError::Io(err) => Some(err),
        }
    }
}

impl From<ApiError> for DifyError {
    fn from(err: ApiError) -> Self {
        DifyError::Api(err)
    }
}

impl From<StreamError> for DifyError {
    fn from(err: StreamError) -> Self {
        DifyError::Stream(err)
    }
}

impl From<ConfigError> for DifyError {
    fn from(err: ConfigError) -> Self {
        DifyError::Config(err)
    }
}

impl From<reqwest::Error> for DifyError {
    fn from(err: reqwest::Error) -> Self {
        DifyError::Http(err)
    }
}

impl From<serde_json::Error> for DifyError {
    fn from(err: serde_json::Error) -> Self {
        DifyError::Json(err)
    }
}

impl From<std::io::Error> for DifyError {
    fn from(err: std::io::Error) -> Self {
        DifyError::Io(err)
    }
}
