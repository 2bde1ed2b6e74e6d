//! HTTP transport seam
//!
//! The orchestrator talks to the network through the [`Transport`] trait:
//! given a request, the transport returns a status code and body, or fails
//! with a transport-level error. [`HttpTransport`] is the reqwest-backed
//! implementation; tests substitute scripted transports.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use super::FetchError;

/// A single HTTP request: URL, method, headers, and optional body.
///
/// Headers live in a `BTreeMap` so that two logically identical requests
/// serialize to identical cache keys regardless of construction order.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A GET request for `url` with no headers or body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Sets the request method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Canonical cache key for this request.
    ///
    /// Identical logical requests must produce identical keys; this is
    /// load-bearing for request coalescing and negative-cache lookups.
    pub fn cache_key(&self) -> String {
        let mut key = format!("{} {}", self.method, self.url);
        for (name, value) in &self.headers {
            key.push('|');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        if let Some(body) = &self.body {
            key.push('|');
            key.push_str(body);
        }
        key
    }
}

/// A completed HTTP exchange: status code plus raw body.
///
/// Non-2xx responses are still `Ok` at the transport level; the
/// orchestrator classifies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network primitive the orchestrator consumes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes the request, returning the response or a transport-level
    /// failure (which never carries a status code).
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured reqwest client (timeouts, proxies, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convenience constructor returning the transport pre-wrapped for
    /// injection into orchestrators.
    pub fn shared() -> Arc<dyn Transport> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::Transport(format!("invalid method: {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
