//! HTTP client abstraction for external API communication.
//!
//! This module provides a trait-based abstraction over HTTP clients, enabling
//! dependency injection and easy mocking in tests. Responses keep their status
//! code so each caller can map it onto its own error taxonomy, and transport
//! failures are classified up front so retry loops can tell a timeout from a
//! refused connection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;

/// A completed HTTP exchange, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any HTTP response at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // Gemini carries its key in the query string.
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

pub type TransportResult = std::result::Result<HttpResponse, TransportError>;

/// Trait for HTTP communication with external APIs.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use reposeed::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.post_json(
///     "https://api.example.com/endpoint",
///     &[("Content-Type", "application/json")],
///     &serde_json::json!({"key": "value"}),
///     Duration::from_secs(30),
/// ).await?;
/// assert!(response.is_success());
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response.
    async fn get(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> TransportResult;

    /// Sends a POST request with JSON body and returns the response.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to send the request to
    /// * `headers` - Key-value pairs of headers to include
    /// * `body` - The JSON body to send
    /// * `timeout` - Upper bound for the whole exchange
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no response could be read. Non-2xx
    /// responses are not errors at this layer.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult;

    /// Sends a PUT request with JSON body and returns the response.
    async fn put_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult;
}

/// HTTP client implementation using reqwest.
///
/// This is the default production implementation that makes real HTTP requests.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default configuration.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn send(
        request: RequestBuilder,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> TransportResult {
        let mut request = request.timeout(timeout);
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> TransportResult {
        Self::send(self.client.get(url), headers, timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult {
        Self::send(self.client.post(url).json(body), headers, timeout).await
    }

    async fn put_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult {
        Self::send(self.client.put(url).json(body), headers, timeout).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request captured by [`ScriptedHttpClient`].
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Option<serde_json::Value>,
        pub timeout: Duration,
    }

    /// Mock HTTP client for testing.
    ///
    /// Replays queued outcomes in order and records every request. Once the
    /// queue runs dry every call fails with a connection error.
    #[derive(Default)]
    pub struct ScriptedHttpClient {
        outcomes: Mutex<VecDeque<TransportResult>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.push(Ok(HttpResponse::new(status, body)))
        }

        pub fn respond_json(self, status: u16, body: serde_json::Value) -> Self {
            self.push(Ok(HttpResponse::new(status, body.to_string())))
        }

        pub fn time_out(self) -> Self {
            self.push(Err(TransportError::Timeout("operation timed out".into())))
        }

        pub fn refuse(self) -> Self {
            self.push(Err(TransportError::Connect("connection refused".into())))
        }

        fn push(self, outcome: TransportResult) -> Self {
            self.outcomes.lock().unwrap().push_back(outcome);
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn record(
            &self,
            method: &'static str,
            url: &str,
            headers: &[(&str, &str)],
            body: Option<&serde_json::Value>,
            timeout: Duration,
        ) -> TransportResult {
            self.requests.lock().unwrap().push(RecordedRequest {
                method,
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.cloned(),
                timeout,
            });
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connect("no scripted response".into())))
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn get(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            timeout: Duration,
        ) -> TransportResult {
            self.record("GET", url, headers, None, timeout)
        }

        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: &serde_json::Value,
            timeout: Duration,
        ) -> TransportResult {
            self.record("POST", url, headers, Some(body), timeout)
        }

        async fn put_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: &serde_json::Value,
            timeout: Duration,
        ) -> TransportResult {
            self.record("PUT", url, headers, Some(body), timeout)
        }
    }
}
