//! HTTP Adapter
//!
//! reqwest implementation of the `TokenListFetcher` port with Retry-After aware
//! backoff for rate-limited endpoints.

mod fetcher;

pub use fetcher::{HttpFetcherConfig, HttpTokenListFetcher};
