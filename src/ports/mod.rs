//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Token list retrieval (HTTP with rate-limit handling)
//! - Output of the classified token lists

pub mod fetcher;
pub mod sink;
pub mod mocks;

// Re-export main traits and types
pub use fetcher::{FetchError, TokenListFetcher};
pub use sink::{CatalogSink, SinkError, WriteSummary};
