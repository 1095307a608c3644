//! Console API client for server administration.
//!
//! [`ConsoleClient`] logs in to a Dify deployment's console API with
//! email/password credentials and drives the app and plugin management
//! endpoints. Batch operations fan out through [`run_batch`] under the
//! client's concurrency cap.

mod apps;
mod batch;
mod plugins;

pub use batch::{run_batch, BatchItemResult};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{RwLock, Semaphore};

use crate::config::Password;
use crate::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS, MARKETPLACE_BASE_URL};
use crate::error::{ApiError, DifyError};

/// Tokens obtained from one console login.
///
/// Held behind a single lock so no request ever observes a half-updated
/// pair when a re-login replaces both.
#[derive(Clone)]
struct Session {
    access_token: String,
    csrf_token: Option<String>,
}

/// Async client for the Dify console API.
///
/// Construct, [`login`](Self::login), then call the app/plugin
/// operations. Cloning is cheap and clones share the session, the HTTP
/// pool, and the concurrency gate.
#[derive(Clone)]
pub struct ConsoleClient {
    base_url: String,
    email: String,
    password: Password,
    http: reqwest::Client,
    timeout: Duration,
    max_concurrency: usize,
    semaphore: Arc<Semaphore>,
    session: Arc<RwLock<Option<Session>>>,
    marketplace_base_url: String,
}

impl ConsoleClient {
    /// Create a client with default timeout and concurrency.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<Password>,
    ) -> Result<Self, DifyError> {
        Self::with_options(
            base_url,
            email,
            password,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_MAX_CONCURRENCY,
        )
    }

    /// Create a client with explicit timeout and concurrency cap.
    pub fn with_options(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<Password>,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Result<Self, DifyError> {
        if timeout.is_zero() {
            return Err(ApiError::Validation {
                message: "timeout must be positive".to_string(),
            }
            .into());
        }
        if max_concurrency < 1 {
            return Err(ApiError::Validation {
                message: "max_concurrency must be at least 1".to_string(),
            }
            .into());
        }

        // Newer deployments deliver auth material via cookies.
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            password: password.into(),
            http,
            timeout,
            max_concurrency,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            session: Arc::new(RwLock::new(None)),
            marketplace_base_url: MARKETPLACE_BASE_URL.to_string(),
        })
    }

    /// Point marketplace version lookups at a different host.
    pub fn with_marketplace_base_url(mut self, url: impl Into<String>) -> Self {
        self.marketplace_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// The normalized base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Concurrency cap applied to this client's batch operations.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Whether a login has succeeded and its tokens are held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Log in with the configured email and password.
    ///
    /// The access token comes from the response body on older
    /// deployments and from an `access_token` cookie on newer ones; the
    /// CSRF cookie is optional. A login with no obtainable access token
    /// is a hard failure. Logging in again replaces the held tokens.
    pub async fn login(&self) -> Result<(), DifyError> {
        tracing::debug!(base_url = %self.base_url, email = %self.email, "logging in to console");

        let response = self
            .http
            .post(self.url("/console/api/login"))
            .timeout(self.timeout)
            .json(&serde_json::json!({
                "email": self.email,
                "password": self.password.expose(),
                "remember_me": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &body).into());
        }

        // Cookies must be read before the body consumes the response.
        let cookie_token = response
            .cookies()
            .find(|c| c.name() == "access_token")
            .map(|c| c.value().to_string());
        let csrf_token = response
            .cookies()
            .find(|c| c.name() == "csrf_token")
            .map(|c| c.value().to_string());

        let body: Value = response.json().await?;
        let access_token = body
            .pointer("/data/access_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or(cookie_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Authentication {
                message: "login response carried no access token".to_string(),
            })?;

        let mut session = self.session.write().await;
        *session = Some(Session {
            access_token,
            csrf_token,
        });
        tracing::info!(base_url = %self.base_url, "logged in to console");
        Ok(())
    }

    /// Drop the held tokens; subsequent requests fail until re-login.
    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        *session = None;
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn marketplace_url(&self, path: &str) -> String {
        format!("{}{}", self.marketplace_base_url, path)
    }

    /// Authenticated request core shared by all console operations.
    ///
    /// Fails fast when not logged in, carries the bearer and CSRF
    /// tokens, and holds a semaphore permit for the full exchange so at
    /// most `max_concurrency` console requests are in flight at once.
    /// An empty response body decodes as `{}`.
    pub(crate) async fn request<T>(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, DifyError>
    where
        T: DeserializeOwned,
    {
        let session = {
            let guard = self.session.read().await;
            guard.clone().ok_or_else(|| ApiError::Authentication {
                message: "not logged in; call login() first".to_string(),
            })?
        };

        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&session.access_token)
            .timeout(self.timeout)
            .query(query);
        if let Some(csrf) = &session.csrf_token {
            request = request.header("X-CSRF-Token", csrf);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let _permit = self.semaphore.acquire().await.unwrap();
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &text).into());
        }

        let text = response.text().await?;
        if text.is_empty() {
            return serde_json::from_str("{}").map_err(DifyError::from);
        }
        serde_json::from_str(&text).map_err(DifyError::from)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DifyError> {
        self.request(reqwest::Method::GET, path, query, None).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, DifyError> {
        self.request(reqwest::Method::POST, path, &[], Some(body))
            .await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, DifyError> {
        self.request(reqwest::Method::PUT, path, &[], Some(body))
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, DifyError> {
        self.request(reqwest::Method::DELETE, path, &[], None).await
    }
}

impl fmt::Debug for ConsoleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleClient")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ConsoleClient::with_options(
            "http://localhost",
            "a@example.com",
            "pw",
            Duration::ZERO,
            5,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = ConsoleClient::with_options(
            "http://localhost",
            "a@example.com",
            "pw",
            Duration::from_secs(30),
            0,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_concurrency"));
    }

    #[test]
    fn test_base_url_normalized() {
        let client = ConsoleClient::new("http://localhost/", "a@example.com", "pw").unwrap();
        assert_eq!(client.base_url(), "http://localhost");
        assert_eq!(client.url("/console/api/apps"), "http://localhost/console/api/apps");
    }

    #[tokio::test]
    async fn test_request_fails_fast_when_unauthenticated() {
        let client = ConsoleClient::new("http://localhost:1", "a@example.com", "pw").unwrap();
        let err = client
            .get::<Value>("/console/api/apps", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DifyError::Api(ApiError::Authentication { .. })
        ));
        assert!(err.to_string().contains("not logged in"));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let client = ConsoleClient::new("http://localhost", "a@example.com", "pw").unwrap();
        assert!(!client.is_authenticated().await);

        {
            let mut session = client.session.write().await;
            *session = Some(Session {
                access_token: "tok".to_string(),
                csrf_token: None,
            });
        }
        assert!(client.is_authenticated().await);

        client.logout().await;
        assert!(!client.is_authenticated().await);
    }

    #[test]
    fn test_debug_omits_password() {
        let client = ConsoleClient::new("http://localhost", "a@example.com", "sekrit").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sekrit"));
    }

    #[test]
    fn test_marketplace_override() {
        let client = ConsoleClient::new("http://localhost", "a@example.com", "pw")
            .unwrap()
            .with_marketplace_base_url("http://mock-marketplace/");
        assert_eq!(
            client.marketplace_url("/api/v1/plugins/org/tool"),
            "http://mock-marketplace/api/v1/plugins/org/tool"
        );
    }
}
