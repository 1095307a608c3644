//! Typed async client for the Dify service API.
//!
//! [`DifyClient`] authenticates with an app API key and exposes the
//! chat, completion, workflow, conversation, and file endpoints. Each
//! endpoint family lives in its own submodule; this module holds the
//! shared request plumbing and response decoding.

mod chat;
mod completion;
mod conversation;
mod files;
mod streaming;
mod workflow;

pub use streaming::EventStream;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{DEFAULT_SSE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use crate::error::{ApiError, DifyError};
use crate::sse::SseParser;

/// Async client for the Dify service API.
///
/// Holds the base URL, the app API key, and the resume bookkeeping for
/// streaming calls. Cloning is cheap: the HTTP connection pool and the
/// SSE parser state are shared between clones.
///
/// # Example
///
/// ```ignore
/// use dify_assistant::{ChatRequest, DifyClient};
///
/// let client = DifyClient::new("https://api.dify.ai/v1", "app-xxx");
/// let response = client
///     .send_message(&ChatRequest::new("Hello!", "user-1"))
///     .await?;
/// println!("{}", response.answer);
/// ```
#[derive(Clone)]
pub struct DifyClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
    timeout: Duration,
    sse_timeout: Duration,
    /// Shared across all streams started by this client so resume state
    /// (`last_event_id`, reconnect attempts) survives individual streams.
    parser: Arc<Mutex<SseParser>>,
}

impl DifyClient {
    /// Create a client with default timeouts.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeouts(
            base_url,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_SSE_TIMEOUT_SECS),
        )
    }

    /// Create a client with explicit timeouts.
    ///
    /// `timeout` bounds blocking requests end to end and the connection
    /// phase of streaming requests; `sse_timeout` bounds the gap between
    /// consecutive chunks on an open stream.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        sse_timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            timeout,
            sse_timeout,
            parser: Arc::new(Mutex::new(SseParser::new())),
        }
    }

    /// The normalized base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// ID of the most recently completed SSE event across this client's
    /// streams, for resume.
    pub fn last_event_id(&self) -> Option<String> {
        self.parser.lock().unwrap().last_event_id().map(String::from)
    }

    /// Transport failures observed since the last completed SSE event.
    pub fn reconnect_attempts(&self) -> u32 {
        self.parser.lock().unwrap().reconnect_attempts()
    }

    /// Clear all SSE resume state, e.g. before a fresh conversation.
    pub fn reset_stream_state(&self) {
        self.parser.lock().unwrap().reset();
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON response.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, DifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    /// GET with query parameters and decode the JSON response.
    pub(crate) async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DifyError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .query(query)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    /// DELETE with query parameters and decode the JSON response.
    pub(crate) async fn delete_json<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DifyError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .query(query)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    /// Classify non-2xx responses, decode 2xx bodies. An empty 2xx body
    /// decodes as `{}` since some endpoints answer 204 No Content.
    pub(crate) async fn decode_response<T>(response: reqwest::Response) -> Result<T, DifyError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &body).into());
        }

        let body = response.text().await?;
        if body.is_empty() {
            return serde_json::from_str("{}").map_err(DifyError::from);
        }
        serde_json::from_str(&body).map_err(DifyError::from)
    }

    /// Start a streaming POST and return an HTTP response whose body is
    /// an open SSE stream. Non-2xx responses are classified eagerly so
    /// the caller gets an API error, never a stream of garbage.
    pub(crate) async fn send_stream_request<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, DifyError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body);

        // Only connection establishment is bounded here; once the stream
        // is open, pacing is enforced per chunk by the SSE timeout.
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| crate::error::StreamError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })??;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &body).into());
        }
        Ok(response)
    }
}

impl fmt::Debug for DifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("sse_timeout", &self.sse_timeout)
            .finish()
    }
}
