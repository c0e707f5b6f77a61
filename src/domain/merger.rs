//! Cross-Source Merger
//!
//! Folds every provider's normalized tokens into one catalog per chain keyed by
//! lower-cased canonical address. Collisions accumulate provenance in
//! `listedIn`; apart from the logo, the first-seen record's fields are kept.
//!
//! Logo reconciliation is driven by [`LogoPrecedence`], a total order over
//! providers, so the winning logo depends on who reported it and not on the
//! order the providers were folded in.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::address::{
    is_native_sentinel, merge_key, to_checksum_address, NATIVE_SENTINEL, ZERO_ADDRESS,
};
use super::chain::ChainId;
use super::token::Token;

/// What to do with native-asset sentinel entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativePolicy {
    /// Merge every sentinel spelling into one canonical-sentinel record
    #[default]
    Collapse,
    /// Leave the `0xeee…e` and `0x…1010` sentinels out of the catalog.
    /// Zero-address entries are kept as ordinary tokens.
    Drop,
}

/// Total order over providers for logo selection (rank 0 wins).
///
/// Explicitly preferred providers come first in the given order; every other
/// configured provider follows in configured order. Names outside both lists
/// share the lowest rank and never displace an existing logo.
#[derive(Debug, Clone, Default)]
pub struct LogoPrecedence {
    ranks: HashMap<String, usize>,
}

impl LogoPrecedence {
    pub fn new<P, C>(preferred: P, configured: C) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut ranks = HashMap::new();
        let preferred = preferred.into_iter().map(|name| name.as_ref().to_string());
        let configured = configured.into_iter().map(|name| name.as_ref().to_string());
        for name in preferred.chain(configured) {
            let next = ranks.len();
            ranks.entry(name).or_insert(next);
        }
        Self { ranks }
    }

    /// Rank of a provider; lower is better
    pub fn rank(&self, provider: &str) -> usize {
        self.ranks.get(provider).copied().unwrap_or(self.ranks.len())
    }

    /// Whether a logo from `incoming` should replace one from `current`
    pub fn prefers(&self, incoming: &str, current: &str) -> bool {
        self.rank(incoming) < self.rank(current)
    }
}

/// Merge behaviour knobs
#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    pub native: NativePolicy,
    pub logo: LogoPrecedence,
}

/// A merged token plus which provider its logo came from
#[derive(Debug, Clone)]
pub struct MergedEntry {
    pub token: Token,
    pub logo_source: Option<String>,
}

/// ChainId -> lower-cased address -> merged token
#[derive(Debug, Clone, Default)]
pub struct MergedCatalog {
    chains: BTreeMap<ChainId, BTreeMap<String, MergedEntry>>,
}

impl MergedCatalog {
    /// Chains with at least one merged token
    pub fn chain_ids(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }

    /// Merged tokens of one chain, in merge-key order
    pub fn tokens(&self, chain_id: &ChainId) -> impl Iterator<Item = &Token> {
        self.chains
            .get(chain_id)
            .into_iter()
            .flat_map(|by_key| by_key.values().map(|entry| &entry.token))
    }

    /// Look up a token by address in any casing
    pub fn get(&self, chain_id: &ChainId, address: &str) -> Option<&Token> {
        self.chains
            .get(chain_id)
            .and_then(|by_key| by_key.get(&merge_key(address)))
            .map(|entry| &entry.token)
    }

    /// Total merged tokens across all chains
    pub fn len(&self) -> usize {
        self.chains.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one token during the fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First report of this (chain, address)
    Inserted,
    /// Another provider already reported it
    Corroborated,
    /// Same provider reported the address twice on this chain
    Duplicate,
    /// Native sentinel dropped by policy
    NativeDropped,
}

/// Counters for one provider's fold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub corroborated: usize,
    pub duplicates: usize,
    pub natives_dropped: usize,
}

impl MergeStats {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Corroborated => self.corroborated += 1,
            MergeOutcome::Duplicate => self.duplicates += 1,
            MergeOutcome::NativeDropped => self.natives_dropped += 1,
        }
    }
}

/// Single-writer fold of provider token lists into a [`MergedCatalog`]
#[derive(Debug, Default)]
pub struct CatalogMerger {
    policy: MergePolicy,
    catalog: MergedCatalog,
}

impl CatalogMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            catalog: MergedCatalog::default(),
        }
    }

    /// Fold one provider's tokens, chain by chain, in emission order.
    pub fn merge_provider<I>(&mut self, provider: &str, chains: I) -> MergeStats
    where
        I: IntoIterator<Item = (ChainId, Vec<Token>)>,
    {
        let mut stats = MergeStats::default();
        for (chain_id, tokens) in chains {
            for token in tokens {
                stats.record(self.merge_token(provider, &chain_id, token));
            }
        }

        tracing::debug!(
            "[{}] merged: {} new, {} corroborated, {} duplicates, {} natives dropped",
            provider,
            stats.inserted,
            stats.corroborated,
            stats.duplicates,
            stats.natives_dropped
        );
        stats
    }

    /// Fold a single token reported by `provider` on `chain_id`.
    pub fn merge_token(
        &mut self,
        provider: &str,
        chain_id: &ChainId,
        mut token: Token,
    ) -> MergeOutcome {
        let mut key = merge_key(&token.address);

        if is_native_sentinel(&key) {
            match self.policy.native {
                NativePolicy::Drop if key != ZERO_ADDRESS => return MergeOutcome::NativeDropped,
                NativePolicy::Drop => {}
                NativePolicy::Collapse => {
                    key = NATIVE_SENTINEL.to_string();
                    if let Ok(canonical) = to_checksum_address(NATIVE_SENTINEL) {
                        token.address = canonical;
                    }
                }
            }
        }

        let by_key = self.catalog.chains.entry(chain_id.clone()).or_default();

        let Some(existing) = by_key.get_mut(&key) else {
            let logo_source = token.logo_uri.as_ref().map(|_| provider.to_string());
            token.listed_in.insert(provider);
            by_key.insert(key, MergedEntry { token, logo_source });
            return MergeOutcome::Inserted;
        };

        let corroborated = existing.token.listed_in.insert(provider);

        if let Some(incoming_logo) = token.logo_uri {
            let replace = match existing.logo_source.as_deref() {
                None => true,
                Some(current) => self.policy.logo.prefers(provider, current),
            };
            if replace {
                existing.token.logo_uri = Some(incoming_logo);
                existing.logo_source = Some(provider.to_string());
            }
        }

        if corroborated {
            MergeOutcome::Corroborated
        } else {
            MergeOutcome::Duplicate
        }
    }

    pub fn catalog(&self) -> &MergedCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> MergedCatalog {
        self.catalog
    }
}
