//! Provider Definitions
//!
//! One entry per external token list source. Each provider declares which
//! payload shape and chain-id handling it needs as explicit variants, so the
//! extractor and normalizer never branch on loose flag combinations.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::chain::ChainId;

/// Which value fills the `{}` placeholder of the URL template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKey {
    /// Provider-specific network slug from the chain table
    #[default]
    Slug,
    /// The chain id itself
    ChainId,
}

/// Where the token collection sits inside the response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    /// First of `tokens`, `data`, `results`, `recommendedTokens`, else the body
    #[default]
    Auto,
    /// As `Auto`, then descend into the current chain's key when present
    ChainKeyed,
}

/// How individual token records are laid out in the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryLayout {
    /// A JSON array of records
    #[default]
    List,
    /// A JSON object mapping some key (usually the address) to records
    Map,
}

/// How records' embedded chain ids are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainIdMode {
    /// Ignore embedded ids; every record belongs to the chain being processed
    #[default]
    Stamp,
    /// Drop records whose embedded id differs; records without one are stamped
    Verify,
    /// Drop records whose embedded id differs or is missing
    Strict,
}

impl ChainIdMode {
    /// Whether embedded chain ids must match the chain being processed
    pub fn verifies(&self) -> bool {
        matches!(self, ChainIdMode::Verify | ChainIdMode::Strict)
    }

    /// Whether a record without an embedded chain id is assumed to be on the current chain
    pub fn assumes_when_absent(&self) -> bool {
        matches!(self, ChainIdMode::Stamp | ChainIdMode::Verify)
    }
}

/// Static configuration for one token list provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Display name, recorded in `listedIn`
    pub name: String,
    /// URL template; `{}` is replaced per chain
    pub url: String,
    /// Chain id -> provider-specific slug
    pub chains: BTreeMap<ChainId, String>,
    #[serde(default)]
    pub url_key: UrlKey,
    #[serde(default)]
    pub envelope: Envelope,
    #[serde(default)]
    pub entries: EntryLayout,
    #[serde(default)]
    pub chain_id: ChainIdMode,
}

impl ProviderConfig {
    /// Minimal list-shaped provider, mostly useful in tests
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            chains: BTreeMap::new(),
            url_key: UrlKey::default(),
            envelope: Envelope::default(),
            entries: EntryLayout::default(),
            chain_id: ChainIdMode::default(),
        }
    }

    /// Builder method to add a chain with its slug
    pub fn with_chain(mut self, chain_id: impl Into<ChainId>, slug: impl Into<String>) -> Self {
        self.chains.insert(chain_id.into(), slug.into());
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_entries(mut self, entries: EntryLayout) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_chain_id_mode(mut self, mode: ChainIdMode) -> Self {
        self.chain_id = mode;
        self
    }

    pub fn with_url_key(mut self, url_key: UrlKey) -> Self {
        self.url_key = url_key;
        self
    }

    /// Request URL for one chain. Fixed URLs (no placeholder) are returned as-is.
    pub fn url_for(&self, chain_id: &ChainId) -> String {
        let key = match self.url_key {
            UrlKey::ChainId => chain_id.as_str(),
            UrlKey::Slug => self
                .chains
                .get(chain_id)
                .map(String::as_str)
                .unwrap_or(chain_id.as_str()),
        };
        self.url.replacen("{}", key, 1)
    }
}
