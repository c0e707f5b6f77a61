//! Trust Classifier
//!
//! Projects the merged catalog into the "all observed" and "trusted" token
//! lists. A token is trusted when at least [`MIN_TRUSTED_SOURCES`] distinct
//! providers listed it.

use std::collections::BTreeMap;

use super::chain::ChainId;
use super::merger::MergedCatalog;
use super::token::Token;

/// Default corroboration threshold
pub const MIN_TRUSTED_SOURCES: usize = 2;

/// Per-chain token lists, chains ordered by id
pub type ChainTokens = BTreeMap<ChainId, Vec<Token>>;

/// Both output projections of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub all_tokens: ChainTokens,
    pub trusted_tokens: ChainTokens,
}

impl Classification {
    pub fn trusted_count(&self) -> usize {
        self.trusted_tokens.values().map(Vec::len).sum()
    }

    pub fn observed_count(&self) -> usize {
        self.all_tokens.values().map(Vec::len).sum()
    }
}

/// Classify with the default threshold of two providers.
pub fn classify(catalog: &MergedCatalog) -> Classification {
    classify_with_threshold(catalog, MIN_TRUSTED_SOURCES)
}

/// Classify with a custom corroboration threshold.
///
/// Each chain's tokens are sorted by canonical address descending (byte-wise,
/// so checksum casing matters). Chains left without tokens are omitted.
pub fn classify_with_threshold(catalog: &MergedCatalog, min_sources: usize) -> Classification {
    let mut classification = Classification::default();

    for chain_id in catalog.chain_ids() {
        let mut all: Vec<Token> = catalog.tokens(chain_id).cloned().collect();
        all.sort_by(|a, b| b.address.cmp(&a.address));

        let trusted: Vec<Token> = all
            .iter()
            .filter(|token| token.source_count() >= min_sources)
            .cloned()
            .collect();

        if !trusted.is_empty() {
            classification.trusted_tokens.insert(chain_id.clone(), trusted);
        }
        if !all.is_empty() {
            classification.all_tokens.insert(chain_id.clone(), all);
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merger::CatalogMerger;
    use crate::domain::token::ListedIn;

    fn token(chain: &str, address: &str) -> Token {
        Token {
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            address: address.to_string(),
            decimals: 18,
            chain_id: ChainId::from(chain),
            logo_uri: None,
            secondary_id: None,
            listed_in: ListedIn::new(),
        }
    }

    fn merged(reports: &[(&str, &str, &str)]) -> MergedCatalog {
        let mut merger = CatalogMerger::default();
        for (provider, chain, address) in reports {
            merger.merge_token(provider, &ChainId::from(*chain), token(chain, address));
        }
        merger.into_catalog()
    }

    #[test]
    fn test_trust_threshold() {
        let catalog = merged(&[
            ("P1", "1", "0xAAA"),
            ("P2", "1", "0xaaa"),
            ("P3", "1", "0xBBB"),
        ]);
        let classification = classify(&catalog);

        assert_eq!(classification.all_tokens[&ChainId::from("1")].len(), 2);
        let trusted = &classification.trusted_tokens[&ChainId::from("1")];
        assert_eq!(trusted.len(), 1);
        assert_eq!(trusted[0].address, "0xAAA");

        for tokens in classification.all_tokens.values() {
            for token in tokens {
                let in_trusted = classification
                    .trusted_tokens
                    .get(&token.chain_id)
                    .map(|list| list.contains(token))
                    .unwrap_or(false);
                assert_eq!(in_trusted, token.listed_in.len() >= 2);
            }
        }
    }

    #[test]
    fn test_chain_without_trusted_tokens_is_omitted() {
        let catalog = merged(&[("P1", "56", "0xCCC"), ("P1", "1", "0xAAA"), ("P2", "1", "0xAAA")]);
        let classification = classify(&catalog);

        assert!(classification.all_tokens.contains_key(&ChainId::from("56")));
        assert!(!classification.trusted_tokens.contains_key(&ChainId::from("56")));
        assert_eq!(classification.trusted_count(), 1);
        assert_eq!(classification.observed_count(), 2);
    }

    #[test]
    fn test_sorted_by_address_descending_case_sensitive() {
        let catalog = merged(&[
            ("P1", "1", "0xAbc"),
            ("P1", "1", "0xaBd"),
            ("P1", "1", "0xFFF"),
        ]);
        let classification = classify(&catalog);

        let addresses: Vec<&str> = classification.all_tokens[&ChainId::from("1")]
            .iter()
            .map(|t| t.address.as_str())
            .collect();
        // lowercase letters sort after uppercase in byte order
        assert_eq!(addresses, vec!["0xaBd", "0xFFF", "0xAbc"]);
    }

    #[test]
    fn test_custom_threshold() {
        let catalog = merged(&[("P1", "1", "0xAAA"), ("P2", "1", "0xAAA"), ("P3", "1", "0xAAA")]);
        assert_eq!(classify_with_threshold(&catalog, 3).trusted_count(), 1);
        assert_eq!(classify_with_threshold(&catalog, 4).trusted_count(), 0);
    }

    #[test]
    fn test_empty_catalog() {
        let classification = classify(&MergedCatalog::default());
        assert!(classification.all_tokens.is_empty());
        assert!(classification.trusted_tokens.is_empty());
    }
}
