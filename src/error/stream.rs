//! Streaming-related error types.
//!
//! This module defines the failures specific to SSE stream processing:
//! malformed event payloads, per-event read timeouts, and lost transport
//! connections. Each variant carries the diagnostic context a caller needs
//! to report the failure or decide on a resume.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// The joined `data:` payload of an event was not valid JSON.
    /// Carries the exact raw text for diagnostics.
    Parse {
        raw: String,
        message: String,
    },

    /// No complete event arrived within the configured per-event timeout.
    Timeout {
        timeout_secs: u64,
    },

    /// The transport-level read failed mid-stream. Carries the parser's
    /// reconnect-attempt count, already incremented for this failure.
    ConnectionLost {
        reconnect_attempts: u32,
        message: String,
    },
}

impl StreamError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Timeout { .. } | StreamError::ConnectionLost { .. }
        )
    }

    /// Check if a caller implementing resume should reconnect.
    pub fn should_reconnect(&self) -> bool {
        matches!(self, StreamError::ConnectionLost { .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Parse { .. } => {
                "Received malformed data from the server. Please try again.".to_string()
            }
            StreamError::Timeout { timeout_secs } => {
                format!(
                    "No event from the server for {} seconds. The connection may have been lost.",
                    timeout_secs
                )
            }
            StreamError::ConnectionLost {
                reconnect_attempts, ..
            } => {
                format!(
                    "Connection to the server was lost (attempt {}).",
                    reconnect_attempts
                )
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Parse { .. } => "E_STREAM_PARSE",
            StreamError::Timeout { .. } => "E_STREAM_TIMEOUT",
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Parse { raw, message } => {
                write!(f, "Failed to parse event payload: {} (raw: {})", message, raw)
            }
            StreamError::Timeout { timeout_secs } => {
                write!(f, "Stream timeout after {} seconds", timeout_secs)
            }
            StreamError::ConnectionLost {
                reconnect_attempts,
                message,
            } => {
                write!(
                    f,
                    "Stream connection lost (attempt {}): {}",
                    reconnect_attempts, message
                )
            }
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_raw_payload() {
        let err = StreamError::Parse {
            raw: "not valid json".to_string(),
            message: "expected value at line 1".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!err.should_reconnect());
        assert_eq!(err.error_code(), "E_STREAM_PARSE");
        let display = format!("{}", err);
        assert!(display.contains("not valid json"));
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = StreamError::Timeout { timeout_secs: 60 };
        assert!(err.is_retryable());
        assert!(!err.should_reconnect());
        assert_eq!(err.error_code(), "E_STREAM_TIMEOUT");
        assert!(err.user_message().contains("60 seconds"));
    }

    #[test]
    fn test_connection_lost_should_reconnect() {
        let err = StreamError::ConnectionLost {
            reconnect_attempts: 2,
            message: "socket closed".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.should_reconnect());
        assert_eq!(err.error_code(), "E_STREAM_CONN");
        assert!(format!("{}", err).contains("attempt 2"));
    }
}
