//! HTTP client abstraction for testability

use std::time::Duration;

use thiserror::Error;

use crate::cache::BoxFuture;

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {code}")]
    Status { code: u16, body: String },

    /// The request could not be sent (DNS, connection, invalid URL).
    #[error("{0}")]
    Url(String),

    /// The request or body read timed out.
    #[error("timed out")]
    Timeout,

    /// The response body could not be read.
    #[error("failed to read response: {0}")]
    Body(String),
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request, returning the response body as text.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<String, HttpError>>;

    /// POSTs a JSON body, optionally with a bearer token, returning the
    /// response body as text.
    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
        bearer_token: Option<&str>,
    ) -> BoxFuture<'_, Result<String, HttpError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Url(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<String, HttpError> {
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(HttpError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_body() || e.is_decode() {
        HttpError::Body(e.to_string())
    } else {
        HttpError::Url(e.to_string())
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<String, HttpError>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request.send().await.map_err(map_reqwest_error)?;
            Self::read(response).await
        })
    }

    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
        bearer_token: Option<&str>,
    ) -> BoxFuture<'_, Result<String, HttpError>> {
        let mut request = self.client.post(url).json(&body);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }
        Box::pin(async move {
            let response = request.send().await.map_err(map_reqwest_error)?;
            Self::read(response).await
        })
    }
}
