//! HTTP fetch pipeline for page content.
//!
//! URLs are canonicalized (see [`url::canonicalize`]) before any
//! request goes out, so the bytes fetched here always correspond to
//! the fingerprint the cache was keyed on.
//!
//! ### Limits
//! - Per-request timeout (configurable; a timeout fails the item, not
//!   the run)
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

use pagecheck_core::Error;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pagecheck/0.1")
    pub user_agent: String,

    /// Cap on response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Per-request timeout (default: 20s)
    pub timeout: Duration,

    /// Redirect limit (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pagecheck/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The canonicalized URL that was requested
    pub url: Url,
    /// Final URL after any redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Raw body bytes
    pub bytes: Bytes,
    /// Wall time for the fetch, in milliseconds
    pub fetch_ms: u64,
}

/// Seam the pipeline fetches through, so tests can substitute a stub
/// that never touches the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and return its HTML body as a string.
    async fn fetch_page(&self, url: &str) -> Result<String, Error>;
}

/// HTTP fetch client with timeout and size limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
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
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Canonicalizes the URL first; the request runs under the
    /// configured timeout and the body is rejected past the byte
    /// limit, whether announced by Content-Length or discovered while
    /// reading.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status: status.as_u16() });
        }

        if let Some(announced) = response.content_length() {
            self.check_size(announced as usize)?;
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| classify_transport_error(e, &url))?;
        self.check_size(bytes.len())?;

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { url, final_url, status, content_type, bytes, fetch_ms })
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }
        Ok(())
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

fn classify_transport_error(err: reqwest::Error, url: &Url) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(url.to_string())
    } else {
        Error::Fetch(format!("network error: {err}"))
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        let response = self.fetch(url).await?;
        Ok(String::from_utf8_lossy(&response.bytes).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "pagecheck/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig::default();
        let client = FetchClient::new(config);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let result = client.fetch("ftp://example.com").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_size_guard() {
        let client = FetchClient::new(FetchConfig { max_bytes: 10, ..Default::default() }).unwrap();
        assert!(client.check_size(10).is_ok());
        assert!(matches!(client.check_size(11), Err(Error::FetchTooLarge(_))));
    }
}
