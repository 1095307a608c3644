//! API error types for the Dify HTTP surface.
//!
//! This module defines errors reported by the service itself: authentication
//! failures, missing resources, rate limits, quota exhaustion, malformed
//! requests, and server-side failures. Non-2xx responses are classified here
//! from their status code and decoded error body.

use std::fmt;

/// The kind of resource a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Conversation,
    Message,
    App,
    Plugin,
    Generic,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Conversation => write!(f, "conversation"),
            ResourceKind::Message => write!(f, "message"),
            ResourceKind::App => write!(f, "app"),
            ResourceKind::Plugin => write!(f, "plugin"),
            ResourceKind::Generic => write!(f, "resource"),
        }
    }
}

/// Errors reported by the Dify API.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Missing or invalid credentials, or an expired session (401).
    Authentication {
        message: String,
    },

    /// Referenced resource does not exist (404).
    NotFound {
        resource: ResourceKind,
        message: String,
    },

    /// Too many requests (429). Carries the server's retry-after hint
    /// in seconds when it provides one.
    RateLimited {
        retry_after: Option<u64>,
        message: String,
    },

    /// Account-level quota exhausted (400 with a quota error code).
    /// Waiting does not help.
    QuotaExceeded {
        message: String,
    },

    /// Malformed request (other 400). Carries the service's error code
    /// and the decoded error body for diagnostics.
    InvalidRequest {
        code: Option<String>,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Service temporarily unavailable (503).
    Unavailable {
        message: String,
    },

    /// Upstream gateway timeout (504).
    GatewayTimeout {
        message: String,
    },

    /// Other server-side failure (5xx).
    Server {
        status: u16,
        message: String,
    },

    /// Local structural validation failed before any network call.
    Validation {
        message: String,
    },

    /// Status code outside the known bands.
    Unexpected {
        status: u16,
        message: String,
    },
}

impl ApiError {
    /// Classify a non-2xx response from its status code and raw body text.
    ///
    /// The body is decoded as a JSON `{"code": …, "message": …}` document;
    /// a body that is not JSON is treated as `{"message": <raw text>}`.
    pub fn from_status(status: u16, body_text: &str) -> ApiError {
        let body: serde_json::Value = serde_json::from_str(body_text)
            .unwrap_or_else(|_| serde_json::json!({ "message": body_text }));

        let code = body
            .get("code")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let message = body
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();

        match status {
            401 => ApiError::Authentication { message },
            404 => ApiError::NotFound {
                resource: ResourceKind::Generic,
                message,
            },
            429 => ApiError::RateLimited {
                retry_after: body.get("retry_after").and_then(|v| v.as_u64()),
                message,
            },
            400 => {
                if code.as_deref() == Some("quota_exceeded")
                    || message.to_lowercase().contains("quota")
                {
                    ApiError::QuotaExceeded { message }
                } else {
                    ApiError::InvalidRequest {
                        code,
                        message,
                        details: Some(body),
                    }
                }
            }
            503 => ApiError::Unavailable { message },
            504 => ApiError::GatewayTimeout { message },
            s if s >= 500 => ApiError::Server { status: s, message },
            s => ApiError::Unexpected { status: s, message },
        }
    }

    /// Retarget a generic `NotFound` at a specific resource kind.
    ///
    /// Callers that know which resource a 404 refers to (e.g. the
    /// conversation API) use this to specialize the classifier's output.
    pub fn for_resource(self, resource: ResourceKind) -> ApiError {
        match self {
            ApiError::NotFound { message, .. } => ApiError::NotFound { resource, message },
            other => other,
        }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::Unavailable { .. }
                | ApiError::GatewayTimeout { .. }
                | ApiError::Server { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Authentication { .. } => {
                "Authentication failed. Check your credentials and log in again.".to_string()
            }
            ApiError::NotFound { resource, message } => {
                format!("The requested {} was not found: {}", resource, message)
            }
            ApiError::RateLimited { retry_after, .. } => match retry_after {
                Some(secs) => format!("Rate limited. Retry after {} seconds.", secs),
                None => "Rate limited. Slow down and retry later.".to_string(),
            },
            ApiError::QuotaExceeded { message } => {
                format!("Account quota exceeded: {}", message)
            }
            ApiError::InvalidRequest { message, .. } => {
                format!("The request was rejected: {}", message)
            }
            ApiError::Unavailable { .. } => {
                "The service is temporarily unavailable. Try again shortly.".to_string()
            }
            ApiError::GatewayTimeout { .. } => {
                "The service did not respond in time. Try again shortly.".to_string()
            }
            ApiError::Server { status, message } => {
                format!("Server error ({}): {}", status, message)
            }
            ApiError::Validation { message } => {
                format!("Invalid input: {}", message)
            }
            ApiError::Unexpected { status, message } => {
                format!("Unexpected response ({}): {}", status, message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Authentication { .. } => "E_API_AUTH",
            ApiError::NotFound { .. } => "E_API_NOT_FOUND",
            ApiError::RateLimited { .. } => "E_API_RATE_LIMIT",
            ApiError::QuotaExceeded { .. } => "E_API_QUOTA",
            ApiError::InvalidRequest { .. } => "E_API_INVALID",
            ApiError::Unavailable { .. } => "E_API_UNAVAILABLE",
            ApiError::GatewayTimeout { .. } => "E_API_GW_TIMEOUT",
            ApiError::Server { .. } => "E_API_SERVER",
            ApiError::Validation { .. } => "E_API_VALIDATION",
            ApiError::Unexpected { .. } => "E_API_UNEXPECTED",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Authentication { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            ApiError::NotFound { resource, message } => {
                write!(f, "{} not found: {}", resource, message)
            }
            ApiError::RateLimited {
                retry_after,
                message,
            } => match retry_after {
                Some(secs) => write!(f, "Rate limited (retry after {}s): {}", secs, message),
                None => write!(f, "Rate limited: {}", message),
            },
            ApiError::QuotaExceeded { message } => {
                write!(f, "Quota exceeded: {}", message)
            }
            ApiError::InvalidRequest { code, message, .. } => match code {
                Some(c) => write!(f, "Invalid request [{}]: {}", c, message),
                None => write!(f, "Invalid request: {}", message),
            },
            ApiError::Unavailable { message } => {
                write!(f, "Service unavailable: {}", message)
            }
            ApiError::GatewayTimeout { message } => {
                write!(f, "Gateway timeout: {}", message)
            }
            ApiError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::Validation { message } => {
                write!(f, "Validation failed: {}", message)
            }
            ApiError::Unexpected { status, message } => {
                write!(f, "Unexpected status {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
