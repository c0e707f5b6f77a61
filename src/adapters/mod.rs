//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - HTTP: reqwest token list fetcher with Retry-After backoff
//! - CoinGecko: secondary id table from the coin listing
//! - Output: JSON token list files
//! - CLI: Command-line interface handlers

pub mod http;
pub mod coingecko;
pub mod output;
pub mod cli;

pub use http::{HttpFetcherConfig, HttpTokenListFetcher};
pub use coingecko::CoinGeckoIdSource;
pub use output::JsonCatalogWriter;
pub use cli::CliApp;
