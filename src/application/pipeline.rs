//! Aggregation Pipeline
//!
//! Runs one collection pass: every provider's fetch-and-normalize pipeline
//! runs concurrently, then the results are folded into a single catalog in
//! configured provider order and classified into trusted and observed lists.
//!
//! Chains within one provider are fetched sequentially. A fetch that exhausts
//! its retry budget drops that provider's whole contribution; every other
//! failure drops a single (provider, chain) pair.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use thiserror::Error;

use crate::domain::{
    classify_with_threshold, extract_entries, normalize_chain, CatalogMerger, ChainId,
    Classification, MergePolicy, MergeStats, ProviderConfig, SecondaryIdTable, Token,
};
use crate::ports::fetcher::TokenListFetcher;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No providers configured")]
    NoProviders,

    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("Trust threshold must be at least 1")]
    InvalidThreshold,
}

/// One (provider, chain) pair that contributed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFailure {
    pub chain_id: ChainId,
    pub error: String,
}

/// How much of a provider made it into the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Every configured chain was fetched and extracted
    Complete,
    /// Some chains failed, the rest contributed
    Partial,
    /// Retry budget exhausted; nothing from this provider was merged
    Aborted(String),
}

/// Outcome of one provider's fetch-and-normalize pass
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub name: String,
    pub status: ProviderStatus,
    /// Accepted tokens per chain, in chain id order
    pub chains: Vec<(ChainId, Vec<Token>)>,
    pub failed_chains: Vec<ChainFailure>,
    pub rejected: usize,
    pub skipped_entries: usize,
}

impl ProviderResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ProviderStatus::Complete,
            chains: Vec::new(),
            failed_chains: Vec::new(),
            rejected: 0,
            skipped_entries: 0,
        }
    }

    pub fn accepted(&self) -> usize {
        self.chains.iter().map(|(_, tokens)| tokens.len()).sum()
    }
}

/// Per-provider line of the run report
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub name: String,
    pub status: ProviderStatus,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped_entries: usize,
    pub failed_chains: Vec<ChainFailure>,
    pub merge: MergeStats,
}

/// Summary of one collection pass
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub providers: Vec<ProviderReport>,
    pub secondary_ids: usize,
    pub observed_count: usize,
    pub trusted_count: usize,
    /// Trusted tokens per chain
    pub trusted_per_chain: BTreeMap<ChainId, usize>,
}

impl RunReport {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn aborted_providers(&self) -> impl Iterator<Item = &ProviderReport> {
        self.providers
            .iter()
            .filter(|p| matches!(p.status, ProviderStatus::Aborted(_)))
    }

    /// Chains ordered by trusted token count, largest first
    pub fn chains_by_count(&self) -> Vec<(&ChainId, usize)> {
        let mut chains: Vec<(&ChainId, usize)> =
            self.trusted_per_chain.iter().map(|(id, n)| (id, *n)).collect();
        chains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        chains
    }
}

/// Result of [`AggregationPipeline::run`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub classification: Classification,
    pub report: RunReport,
}

/// Fetch, normalize, merge, and classify token lists from a provider table
pub struct AggregationPipeline {
    providers: Vec<ProviderConfig>,
    fetcher: Arc<dyn TokenListFetcher>,
    secondary_ids: SecondaryIdTable,
    policy: MergePolicy,
    min_sources: usize,
}

impl AggregationPipeline {
    pub fn new(
        providers: Vec<ProviderConfig>,
        fetcher: Arc<dyn TokenListFetcher>,
        secondary_ids: SecondaryIdTable,
        policy: MergePolicy,
        min_sources: usize,
    ) -> Result<Self, PipelineError> {
        if providers.is_empty() {
            return Err(PipelineError::NoProviders);
        }
        if min_sources == 0 {
            return Err(PipelineError::InvalidThreshold);
        }
        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.name == provider.name) {
                return Err(PipelineError::DuplicateProvider(provider.name.clone()));
            }
        }

        Ok(Self {
            providers,
            fetcher,
            secondary_ids,
            policy,
            min_sources,
        })
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Run one full collection pass.
    pub async fn run(&self) -> PipelineOutput {
        let started_at = Utc::now();
        tracing::info!(
            "Collecting token lists from {} providers ({} secondary ids loaded)",
            self.providers.len(),
            self.secondary_ids.len()
        );

        // join_all yields results in input order regardless of completion order
        let results = join_all(self.providers.iter().map(|p| self.collect_provider(p))).await;

        let mut merger = CatalogMerger::new(self.policy.clone());
        let mut reports = Vec::with_capacity(results.len());

        for result in results {
            let accepted = result.accepted();
            let merge = match result.status {
                ProviderStatus::Aborted(_) => MergeStats::default(),
                _ => merger.merge_provider(&result.name, result.chains),
            };
            reports.push(ProviderReport {
                accepted,
                name: result.name,
                status: result.status,
                rejected: result.rejected,
                skipped_entries: result.skipped_entries,
                failed_chains: result.failed_chains,
                merge,
            });
        }

        let catalog = merger.into_catalog();
        let classification = classify_with_threshold(&catalog, self.min_sources);

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            providers: reports,
            secondary_ids: self.secondary_ids.len(),
            observed_count: classification.observed_count(),
            trusted_count: classification.trusted_count(),
            trusted_per_chain: classification
                .trusted_tokens
                .iter()
                .map(|(id, tokens)| (id.clone(), tokens.len()))
                .collect(),
        };

        tracing::info!(
            "Collection finished in {:.1}s: {} observed, {} trusted across {} chains",
            report.duration_secs(),
            report.observed_count,
            report.trusted_count,
            report.trusted_per_chain.len()
        );

        PipelineOutput {
            classification,
            report,
        }
    }

    /// Fetch and normalize every configured chain of one provider.
    pub async fn collect_provider(&self, provider: &ProviderConfig) -> ProviderResult {
        let mut result = ProviderResult::new(&provider.name);

        for chain_id in provider.chains.keys() {
            let url = provider.url_for(chain_id);
            tracing::debug!("[{}] chain {}: GET {}", provider.name, chain_id, url);

            let body = match self.fetcher.fetch_json(&url).await {
                Ok(body) => body,
                Err(e) if e.aborts_provider() => {
                    tracing::error!("[{}] aborted, contribution dropped: {}", provider.name, e);
                    result.status = ProviderStatus::Aborted(e.to_string());
                    result.chains.clear();
                    return result;
                }
                Err(e) => {
                    tracing::warn!("[{}] chain {}: fetch failed: {}", provider.name, chain_id, e);
                    result.failed_chains.push(ChainFailure {
                        chain_id: chain_id.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let extracted = match extract_entries(body, provider, chain_id) {
                Ok(extracted) => extracted,
                Err(e) => {
                    tracing::warn!("[{}] chain {}: {}", provider.name, chain_id, e);
                    result.failed_chains.push(ChainFailure {
                        chain_id: chain_id.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let normalized =
                normalize_chain(&extracted.records, provider, chain_id, &self.secondary_ids);

            tracing::info!(
                "[{}] chain {}: {} tokens accepted, {} rejected",
                provider.name,
                chain_id,
                normalized.tokens.len(),
                normalized.rejected.len()
            );

            result.skipped_entries += extracted.skipped.len();
            result.rejected += normalized.rejected.len();
            result.chains.push((chain_id.clone(), normalized.tokens));
        }

        if !result.failed_chains.is_empty() {
            result.status = ProviderStatus::Partial;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryLayout, NativePolicy};
    use crate::ports::fetcher::FetchError;
    use crate::ports::mocks::StaticFetcher;
    use serde_json::json;

    const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    fn provider(name: &str) -> ProviderConfig {
        ProviderConfig::new(name, format!("https://{name}.test/{{}}.json"))
            .with_chain("1", "ethereum")
            .with_chain("56", "bsc")
    }

    fn record(address: &str, symbol: &str) -> serde_json::Value {
        json!({"address": address, "symbol": symbol, "name": symbol, "decimals": 6})
    }

    fn pipeline(providers: Vec<ProviderConfig>, fetcher: StaticFetcher) -> AggregationPipeline {
        AggregationPipeline::new(
            providers,
            Arc::new(fetcher),
            SecondaryIdTable::new(),
            MergePolicy::default(),
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let fetcher: Arc<dyn TokenListFetcher> = Arc::new(StaticFetcher::new());
        let err = AggregationPipeline::new(
            vec![],
            fetcher.clone(),
            SecondaryIdTable::new(),
            MergePolicy::default(),
            2,
        );
        assert!(matches!(err, Err(PipelineError::NoProviders)));

        let err = AggregationPipeline::new(
            vec![provider("a"), provider("a")],
            fetcher.clone(),
            SecondaryIdTable::new(),
            MergePolicy::default(),
            2,
        );
        assert!(matches!(err, Err(PipelineError::DuplicateProvider(name)) if name == "a"));

        let err = AggregationPipeline::new(
            vec![provider("a")],
            fetcher,
            SecondaryIdTable::new(),
            MergePolicy::default(),
            0,
        );
        assert!(matches!(err, Err(PipelineError::InvalidThreshold)));
    }

    #[tokio::test]
    async fn test_collect_provider_fetches_each_chain() {
        let fetcher = StaticFetcher::new()
            .with_response(
                "https://a.test/ethereum.json",
                json!({"tokens": [record(USDT, "USDT")]}),
            )
            .with_response("https://a.test/bsc.json", json!([]));
        let pipeline = pipeline(vec![provider("a")], fetcher.clone());

        let result = pipeline.collect_provider(&provider("a")).await;

        assert_eq!(result.status, ProviderStatus::Complete);
        assert_eq!(result.accepted(), 1);
        assert_eq!(fetcher.get_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_chain_failure_keeps_other_chains() {
        let fetcher = StaticFetcher::new()
            .with_response("https://a.test/ethereum.json", json!([record(USDT, "USDT")]))
            .with_error(
                "https://a.test/bsc.json",
                FetchError::Timeout("https://a.test/bsc.json".to_string()),
            );
        let pipeline = pipeline(vec![provider("a")], fetcher);

        let result = pipeline.collect_provider(&provider("a")).await;

        assert_eq!(result.status, ProviderStatus::Partial);
        assert_eq!(result.failed_chains.len(), 1);
        assert_eq!(result.failed_chains[0].chain_id, ChainId::from("56"));
        assert_eq!(result.accepted(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload_drops_only_that_chain() {
        let fetcher = StaticFetcher::new()
            .with_response("https://a.test/ethereum.json", json!({"message": "not here"}))
            .with_response("https://a.test/bsc.json", json!([record(USDT, "USDT")]));
        let pipeline = pipeline(vec![provider("a")], fetcher);

        let result = pipeline.collect_provider(&provider("a")).await;

        assert_eq!(result.status, ProviderStatus::Partial);
        assert_eq!(result.chains.len(), 1);
        assert_eq!(result.chains[0].0, ChainId::from("56"));
    }

    #[tokio::test]
    async fn test_exhaustion_aborts_provider() {
        let fetcher = StaticFetcher::new()
            .with_response("https://a.test/ethereum.json", json!([record(USDT, "USDT")]))
            .with_error(
                "https://a.test/bsc.json",
                FetchError::Exhausted {
                    url: "https://a.test/bsc.json".to_string(),
                    attempts: 61,
                    last_status: 429,
                },
            )
            .with_response("https://b.test/ethereum.json", json!([record(USDT, "USDT")]))
            .with_response("https://b.test/bsc.json", json!([]));
        let pipeline = pipeline(vec![provider("a"), provider("b")], fetcher);

        let output = pipeline.run().await;

        assert!(matches!(output.report.providers[0].status, ProviderStatus::Aborted(_)));
        assert_eq!(output.report.aborted_providers().count(), 1);

        // b alone cannot make USDT trusted
        assert_eq!(output.classification.trusted_count(), 0);
        let observed = &output.classification.all_tokens[&ChainId::from("1")];
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].listed_in.iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_run_merges_and_classifies() {
        let fetcher = StaticFetcher::new()
            .with_response(
                "https://a.test/ethereum.json",
                json!([record(&USDT.to_lowercase(), "USDT")]),
            )
            .with_response("https://a.test/bsc.json", json!([]))
            .with_response(
                "https://b.test/ethereum.json",
                json!({"tokens": [
                    record(USDT, "USDT"),
                    record("0x0000000000000000000000000000000000000abc", "ABC"),
                ]}),
            )
            .with_response("https://b.test/bsc.json", json!([]));
        let pipeline = pipeline(vec![provider("a"), provider("b")], fetcher);

        let output = pipeline.run().await;

        let trusted = &output.classification.trusted_tokens[&ChainId::from("1")];
        assert_eq!(trusted.len(), 1);
        assert_eq!(trusted[0].address, USDT);
        assert_eq!(trusted[0].listed_in.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        assert_eq!(output.report.observed_count, 2);
        assert_eq!(output.report.trusted_count, 1);
        assert_eq!(output.report.providers[1].merge.corroborated, 1);
        assert_eq!(output.report.providers[1].merge.inserted, 1);
        assert!(output.report.finished_at >= output.report.started_at);
    }

    #[tokio::test]
    async fn test_map_layout_provider() {
        let map_provider = ProviderConfig::new("m", "https://m.test/{}")
            .with_chain("1", "1")
            .with_entries(EntryLayout::Map);
        let fetcher = StaticFetcher::new().with_response(
            "https://m.test/1",
            json!({"tokens": {USDT: record(USDT, "USDT")}}),
        );
        let pipeline = AggregationPipeline::new(
            vec![map_provider.clone()],
            Arc::new(fetcher),
            SecondaryIdTable::new(),
            MergePolicy {
                native: NativePolicy::Drop,
                ..MergePolicy::default()
            },
            1,
        )
        .unwrap();

        let output = pipeline.run().await;
        assert_eq!(output.classification.trusted_count(), 1);
    }

    #[test]
    fn test_chains_by_count_sorted_descending() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            providers: vec![],
            secondary_ids: 0,
            observed_count: 0,
            trusted_count: 0,
            trusted_per_chain: [
                (ChainId::from("1"), 5),
                (ChainId::from("56"), 9),
                (ChainId::from("10"), 5),
            ]
            .into_iter()
            .collect(),
        };

        let order: Vec<&str> = report
            .chains_by_count()
            .into_iter()
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(order, vec!["56", "1", "10"]);
    }
}
