//! Token List Fetcher Port
//!
//! Retrieval of one provider payload for one (provider, chain) URL. Rate-limit
//! handling lives behind this trait; callers only see a parsed document or a
//! classified failure.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Fetch failures, classified by how far they reach
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Retry budget exhausted for {url} after {attempts} attempts (status {last_status})")]
    Exhausted {
        url: String,
        attempts: u32,
        last_status: u16,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Whether this failure drops the provider's whole contribution rather
    /// than a single chain.
    pub fn aborts_provider(&self) -> bool {
        matches!(self, FetchError::Exhausted { .. })
    }
}

/// Port for retrieving raw provider payloads
#[async_trait]
pub trait TokenListFetcher: Send + Sync {
    /// GET `url` and parse the body as JSON
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}
