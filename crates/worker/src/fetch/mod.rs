//! HTTP backend for the retrieval policies.
//!
//! Every fetch resolves to an explicit [`FetchOutcome`] rather than an
//! error: a reachable origin always yields `Response` (whatever the
//! status), and transport failures yield `Failed` with the reason. The
//! policies branch on that distinction, never on caught exceptions.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};

use crate::request::WorkerRequest;
use lantern_core::Error;

pub use self::url::{UrlError, canonicalize, resolve};

/// Configuration for the HTTP backend.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "lantern/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "lantern/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// A live network response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: reqwest::StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Outcome of a network fetch.
///
/// Non-200 statuses are still `Response`. `Failed` means the transport
/// itself gave out: connection refused, TLS, timeout, oversized body.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Response(FetchResponse),
    Failed { reason: String },
}

/// Network access seam for the controller.
///
/// The production implementation is [`ReqwestBackend`]; tests substitute a
/// scripted in-memory backend.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn execute(&self, request: &WorkerRequest) -> FetchOutcome;
}

/// reqwest-based HTTP backend.
pub struct ReqwestBackend {
    http: Client,
    config: FetchConfig,
}

impl ReqwestBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: &WorkerRequest) -> FetchOutcome {
        let start = Instant::now();

        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed { reason: format!("network error: {e}") },
        };

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return FetchOutcome::Failed { reason: format!("{} bytes exceeds {}", len, self.config.max_bytes) };
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return FetchOutcome::Failed { reason: format!("failed to read response: {e}") },
        };

        if bytes.len() > self.config.max_bytes {
            return FetchOutcome::Failed { reason: format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes) };
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} {} in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        FetchOutcome::Response(FetchResponse {
            url: request.url.clone(),
            final_url,
            status,
            content_type,
            headers,
            bytes,
            fetch_ms,
        })
    }
}
