//! Secondary Identifier Lookup
//!
//! Built once per run from an external coin listing. Keyed by chain and
//! lower-cased address; a missing key just means the token has no secondary id.

use std::collections::HashMap;

use super::address::merge_key;
use super::chain::ChainId;

/// ChainId -> lower-cased address -> secondary id
#[derive(Debug, Clone, Default)]
pub struct SecondaryIdTable {
    entries: HashMap<ChainId, HashMap<String, String>>,
}

impl SecondaryIdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the id for an address on a chain.
    pub fn insert(&mut self, chain_id: ChainId, address: &str, id: impl Into<String>) {
        self.entries
            .entry(chain_id)
            .or_default()
            .insert(merge_key(address), id.into());
    }

    /// Look up an address in any casing.
    pub fn lookup(&self, chain_id: &ChainId, address: &str) -> Option<&str> {
        self.entries
            .get(chain_id)
            .and_then(|by_address| by_address.get(&merge_key(address)))
            .map(String::as_str)
    }

    /// Total number of (chain, address) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
