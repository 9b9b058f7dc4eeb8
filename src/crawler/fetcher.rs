//! HTTP fetcher boundary
//!
//! The engine talks to the network through the [`Fetcher`] trait so tests
//! can substitute deterministic fakes. [`HttpFetcher`] is the reqwest-backed
//! production implementation. Fetch failures carry enough shape for the
//! retry policy to classify them.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A failed fetch attempt
#[derive(Debug, Clone, Error)]
pub enum FetchFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("expected HTML content, got {content_type}")]
    ContentTypeMismatch { content_type: String, status: u16 },

    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchFailure {
    /// HTTP status code associated with this failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(status) => Some(*status),
            Self::ContentTypeMismatch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A successful fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code (always < 400 here)
    pub status: u16,
    /// Response body
    pub body: String,
    /// Time from dispatch to body completion
    pub elapsed: Duration,
}

/// Boundary trait for HTTP transport
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL with the given extra headers and per-request timeout
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchFailure>;
}

/// Builds the shared HTTP client
///
/// No client-level timeout: the per-request timeout comes from each task's
/// configuration.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchFailure> {
        let started = Instant::now();

        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchFailure::HttpStatus(status));
        }

        // An explicitly non-HTML content type is not crawlable
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.is_empty()
            && !content_type.contains("text/html")
            && !content_type.contains("xhtml")
        {
            return Err(FetchFailure::ContentTypeMismatch { content_type, status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        Ok(FetchResponse {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }
}

/// Maps a reqwest error onto the failure taxonomy
fn classify_reqwest_error(error: reqwest::Error, timeout: Duration) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout(timeout)
    } else if error.is_connect() {
        FetchFailure::Connect(error.to_string())
    } else if error.is_builder() {
        FetchFailure::MalformedUrl(error.to_string())
    } else {
        FetchFailure::Transport(error.to_string())
    }
}
