//! CoinGecko Coin Listing
//!
//! `coins/list?include_platform=true` returns every coin with a map of
//! platform slug to contract address. Platform slugs are mapped to chain ids
//! through a configured table; everything else is ignored.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use serde::Deserialize;

use crate::domain::{ChainId, SecondaryIdTable};
use crate::ports::fetcher::{FetchError, TokenListFetcher};

pub const DEFAULT_COINS_LIST_URL: &str =
    "https://api.coingecko.com/api/v3/coins/list?include_platform=true";

/// Header carrying a demo-plan API key
pub const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// One coin from the listing
#[derive(Debug, Clone, Deserialize)]
pub struct CoinListing {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    /// Platform slug -> contract address (null or empty for some platforms)
    #[serde(default)]
    pub platforms: HashMap<String, Option<String>>,
}

/// Index coin listings by (chain, lower-cased address).
///
/// Coins with an empty id, platforms without a mapping, and empty addresses
/// are skipped.
pub fn build_secondary_ids(
    coins: &[CoinListing],
    platform_chains: &HashMap<String, ChainId>,
) -> SecondaryIdTable {
    let mut table = SecondaryIdTable::new();

    for coin in coins.iter().filter(|c| !c.id.is_empty()) {
        for (platform, address) in &coin.platforms {
            let Some(chain_id) = platform_chains.get(platform) else {
                continue;
            };
            match address.as_deref().map(str::trim) {
                Some(address) if !address.is_empty() => {
                    table.insert(chain_id.clone(), address, coin.id.as_str());
                }
                _ => {}
            }
        }
    }

    table
}

/// Loads the secondary-id table through a [`TokenListFetcher`]
pub struct CoinGeckoIdSource {
    fetcher: Arc<dyn TokenListFetcher>,
    url: String,
    platform_chains: HashMap<String, ChainId>,
}

impl CoinGeckoIdSource {
    /// `platforms` maps chain id to CoinGecko platform slug.
    pub fn new(
        fetcher: Arc<dyn TokenListFetcher>,
        url: impl Into<String>,
        platforms: &BTreeMap<ChainId, String>,
    ) -> Self {
        let platform_chains = platforms
            .iter()
            .map(|(chain_id, slug)| (slug.clone(), chain_id.clone()))
            .collect();

        Self {
            fetcher,
            url: url.into(),
            platform_chains,
        }
    }

    /// Fetch and index the coin listing.
    pub async fn load(&self) -> Result<SecondaryIdTable, FetchError> {
        let body = self.fetcher.fetch_json(&self.url).await?;
        let coins: Vec<CoinListing> = serde_json::from_value(body).map_err(|e| FetchError::Parse {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        let table = build_secondary_ids(&coins, &self.platform_chains);
        tracing::info!(
            "Loaded {} CoinGecko ids from {} coins",
            table.len(),
            coins.len()
        );
        Ok(table)
    }

    /// Like [`load`](Self::load), but falls back to an empty table.
    pub async fn load_or_empty(&self) -> SecondaryIdTable {
        match self.load().await {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("CoinGecko ids unavailable, continuing without them: {}", e);
                SecondaryIdTable::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::StaticFetcher;
    use serde_json::json;

    const URL: &str = "https://cg.test/coins/list";

    fn listing() -> serde_json::Value {
        json!([
            {
                "id": "tether",
                "symbol": "usdt",
                "name": "Tether",
                "platforms": {
                    "ethereum": "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                    "binance-smart-chain": "0x55d398326f99059ff775485246999027b3197955",
                    "tron": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t"
                }
            },
            {"id": "bitcoin", "symbol": "btc", "platforms": {}},
            {
                "id": "",
                "symbol": "ghost",
                "platforms": {"ethereum": "0x1111111111111111111111111111111111111111"}
            },
            {"id": "weird", "symbol": "w", "platforms": {"ethereum": null, "": "0x22"}}
        ])
    }

    fn platforms() -> BTreeMap<ChainId, String> {
        [
            (ChainId::from("1"), "ethereum".to_string()),
            (ChainId::from("56"), "binance-smart-chain".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_build_secondary_ids() {
        let coins: Vec<CoinListing> = serde_json::from_value(listing()).unwrap();
        let platform_chains: HashMap<String, ChainId> = platforms()
            .into_iter()
            .map(|(id, slug)| (slug, id))
            .collect();

        let table = build_secondary_ids(&coins, &platform_chains);

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&ChainId::from("1"), "0xdac17f958d2ee523a2206206994597c13d831ec7"),
            Some("tether")
        );
        assert_eq!(
            table.lookup(&ChainId::from("56"), "0x55D398326F99059FF775485246999027B3197955"),
            Some("tether")
        );
        assert_eq!(
            table.lookup(&ChainId::from("1"), "0x1111111111111111111111111111111111111111"),
            None
        );
    }

    #[tokio::test]
    async fn test_load_through_fetcher() {
        let fetcher = StaticFetcher::new().with_response(URL, listing());
        let source = CoinGeckoIdSource::new(Arc::new(fetcher.clone()), URL, &platforms());

        let table = source.load().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(fetcher.get_calls(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_parse_error() {
        let fetcher =
            StaticFetcher::new().with_response(URL, json!({"status": {"error_code": 429}}));
        let source = CoinGeckoIdSource::new(Arc::new(fetcher), URL, &platforms());

        assert!(matches!(source.load().await, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_load_or_empty_on_failure() {
        let source = CoinGeckoIdSource::new(Arc::new(StaticFetcher::new()), URL, &platforms());
        assert!(source.load_or_empty().await.is_empty());
    }
}
