//! Golemio PID HTTP client.
//!
//! Thin reqwest wrapper: adds the access token header, bounds concurrency and
//! maps HTTP outcomes to [`TransportError`]. Retrying lives in
//! [`RetryingTransport`](super::RetryingTransport).

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use super::error::TransportError;
use super::transport::{RawResponse, Transport};

/// Default base URL for the Golemio v2 API.
const DEFAULT_BASE_URL: &str = "https://api.golemio.cz/v2";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Departure boards are latency-sensitive, so this is shorter than a generic request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Header carrying the Golemio access token.
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Configuration for the PID client.
#[derive(Debug, Clone)]
pub struct PidConfig {
    /// Golemio access token
    pub api_key: String,
    /// Base URL for the API (defaults to production Golemio)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PidConfig {
    /// Create a new config with the given access token.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Golemio PID API client.
#[derive(Debug, Clone)]
pub struct PidClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl PidClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PidConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();

        let token = HeaderValue::from_str(&config.api_key)
            .map_err(|_| TransportError::InvalidConfig("invalid access token format".into()))?;
        headers.insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for PidClient {
    async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RawResponse, TransportError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TransportError::Network("request semaphore closed".into()))?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "upstream request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "upstream response");

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = PidConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_timeout(20);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 20);
    }

    #[test]
    fn config_defaults() {
        let config = PidConfig::new("test-key");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 8);
    }

    #[test]
    fn client_creation() {
        let client = PidClient::new(PidConfig::new("test-key").with_base_url("http://x/v2/"));
        assert_eq!(client.unwrap().base_url(), "http://x/v2");
    }

    #[test]
    fn rejects_unprintable_token() {
        let result = PidClient::new(PidConfig::new("bad\ntoken"));
        assert!(matches!(result, Err(TransportError::InvalidConfig(_))));
    }
}
