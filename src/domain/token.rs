//! Canonical Token Record
//!
//! The single schema every provider's records are normalized into, and the
//! shape written to the output token lists.

use serde::{Deserialize, Serialize};

use super::chain::ChainId;

/// Canonical token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub symbol: String,
    pub name: String,
    /// Canonical address (EIP-55 checksum for EVM chains)
    pub address: String,
    pub decimals: u32,
    pub chain_id: ChainId,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    /// CoinGecko coin id, when the auxiliary listing knows the address
    #[serde(rename = "coingeckoId", default, skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<String>,
    /// Providers that reported this token, in first-seen order
    #[serde(default)]
    pub listed_in: ListedIn,
}

impl Token {
    /// Number of distinct providers that reported this token
    pub fn source_count(&self) -> usize {
        self.listed_in.len()
    }
}

/// Insertion-ordered set of provider names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListedIn(Vec<String>);

impl ListedIn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider unless already present. Returns true if it was added.
    pub fn insert(&mut self, provider: &str) -> bool {
        if self.contains(provider) {
            return false;
        }
        self.0.push(provider.to_string());
        true
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.0.iter().any(|p| p == provider)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ListedIn {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut listed = ListedIn::new();
        for provider in iter {
            listed.insert(provider.as_ref());
        }
        listed
    }
}
