//! In-memory port implementations for tests and dry runs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use serde_json::Value;

use super::fetcher::{FetchError, TokenListFetcher};
use super::sink::{CatalogSink, SinkError, WriteSummary};
use crate::domain::Classification;

/// Fetcher that serves canned responses by URL and records every call
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    calls: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<HashMap<String, Result<Value, FetchError>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve a JSON body for a URL
    pub fn with_response(self, url: &str, body: Value) -> Self {
        self.responses.lock().unwrap().insert(url.to_string(), Ok(body));
        self
    }

    /// Builder method to fail a URL
    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.responses.lock().unwrap().insert(url.to_string(), Err(error));
        self
    }

    /// Builder method to hold back the response for a URL
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenListFetcher for StaticFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Status { url: url.to_string(), status: 404 }))
    }
}

/// Sink that keeps the last written classification
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    written: Arc<Mutex<Vec<Classification>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Classification> {
        self.written.lock().unwrap().last().cloned()
    }
}

impl CatalogSink for MemorySink {
    fn write(&self, classification: &Classification) -> Result<WriteSummary, SinkError> {
        self.written.lock().unwrap().push(classification.clone());
        Ok(WriteSummary::default())
    }
}
