//! Tokenlists - Multi-chain token list aggregator library
//!
//! Collects token lists from many independent providers, normalizes and merges
//! them per chain by canonical address, and classifies tokens listed by at
//! least two providers as trusted.
//!
//! # Modules
//!
//! - `domain`: Core logic (shape extraction, normalization, merging, trust classification)
//! - `ports`: Trait abstractions (TokenListFetcher, CatalogSink)
//! - `adapters`: External implementations (HTTP, CoinGecko, JSON output, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Aggregation pipeline

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
