//! Token List HTTP Fetcher
//!
//! Fetches provider payloads over HTTP. Rate-limited (429) and server-error
//! responses are retried after the delay the server asks for in `Retry-After`,
//! up to a retry ceiling. Bodies are read as text and parsed as JSON, since
//! raw GitHub files come back as `text/plain`.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::ports::fetcher::{FetchError, TokenListFetcher};

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt before giving up
    pub max_retries: u32,
    /// Wait used when the server sends no usable Retry-After header
    pub default_retry_delay: Duration,
    /// Upper bound on any single wait
    pub max_retry_delay: Duration,
    /// Extra headers sent with every request (API keys)
    pub headers: Vec<(String, String)>,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 60,
            default_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(120),
            headers: Vec::new(),
        }
    }
}

/// reqwest-backed token list fetcher
#[derive(Debug, Clone)]
pub struct HttpTokenListFetcher {
    config: HttpFetcherConfig,
    http: Client,
}

impl HttpTokenListFetcher {
    /// Create a new fetcher with custom configuration
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tokenlists/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Send an extra header with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Wait requested by the server, falling back to the configured default
    fn retry_delay(&self, headers: &HeaderMap) -> Duration {
        let requested = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_retry_delay);

        requested.min(self.config.max_retry_delay)
    }

    fn classify_send_error(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else {
            FetchError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl TokenListFetcher for HttpTokenListFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let mut req = self.http.get(url);
            for (name, value) in &self.config.headers {
                req = req.header(name.as_str(), value.as_str());
            }

            let response = req
                .send()
                .await
                .map_err(|e| Self::classify_send_error(url, e))?;
            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| Self::classify_send_error(url, e))?;
                return serde_json::from_str(&text).map_err(|e| FetchError::Parse {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempts > self.config.max_retries {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts,
                        last_status: status.as_u16(),
                    });
                }

                let delay = self.retry_delay(response.headers());
                tracing::warn!(
                    "{} returned {}, waiting {:?} (retry {}/{})",
                    url,
                    status,
                    delay,
                    attempts,
                    self.config.max_retries
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
    }
}
