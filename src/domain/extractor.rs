//! Shape Extractor
//!
//! Locates the token collection inside a provider's response body and yields
//! the raw per-token records. Envelope keys are checked in a fixed priority
//! order; a chain-keyed provider then descends into the current chain's entry,
//! and a map-shaped provider is projected to its values.

use serde_json::{Map, Value};
use thiserror::Error;

use super::chain::ChainId;
use super::provider::{EntryLayout, Envelope, ProviderConfig};

/// Envelope keys, highest priority first
pub const ENVELOPE_KEYS: &[&str] = &["tokens", "data", "results", "recommendedTokens"];

/// Raw per-token record as the provider sent it
pub type RawRecord = Map<String, Value>;

/// The whole payload was unusable for this (provider, chain)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("Malformed payload: expected a token collection, found {found}")]
    MalformedPayload { found: &'static str },
}

/// An entry that was skipped because it isn't a JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct EntryError {
    /// Position in the collection (map layouts use value order)
    pub index: usize,
    pub kind: &'static str,
    pub entry: Value,
}

/// Extraction result: usable records plus the entries that were skipped
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub records: Vec<RawRecord>,
    pub skipped: Vec<EntryError>,
}

/// Pull raw token records for `chain_id` out of a response body.
///
/// Only a missing collection fails the payload; individual non-record entries
/// are reported in [`Extracted::skipped`] and extraction carries on.
pub fn extract_entries(
    body: Value,
    provider: &ProviderConfig,
    chain_id: &ChainId,
) -> Result<Extracted, ShapeError> {
    let mut collection = unwrap_envelope(body);

    if provider.envelope == Envelope::ChainKeyed {
        collection = descend_into_chain(collection, chain_id);
    }

    let entries: Vec<Value> = match (collection, provider.entries) {
        (Value::Array(items), _) => items,
        // Order of map values is provider-dependent; nothing downstream relies on it
        (Value::Object(map), EntryLayout::Map) => map.into_iter().map(|(_, v)| v).collect(),
        (other, _) => {
            return Err(ShapeError::MalformedPayload {
                found: json_kind(&other),
            })
        }
    };

    let mut extracted = Extracted::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(record) => extracted.records.push(record),
            other => {
                tracing::warn!(
                    "[{}] chain {}: skipping non-record entry #{} ({})",
                    provider.name,
                    chain_id,
                    index,
                    json_kind(&other)
                );
                extracted.skipped.push(EntryError {
                    index,
                    kind: json_kind(&other),
                    entry: other,
                });
            }
        }
    }

    Ok(extracted)
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if let Some(inner) = map.remove(*key) {
                    return inner;
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn descend_into_chain(collection: Value, chain_id: &ChainId) -> Value {
    match collection {
        Value::Object(mut by_chain) => match by_chain.remove(chain_id.as_str()) {
            Some(inner) => inner,
            None => Value::Object(by_chain),
        },
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_provider() -> ProviderConfig {
        ProviderConfig::new("test", "https://example.com/{}.json").with_chain("1", "mainnet")
    }

    fn eth() -> ChainId {
        ChainId::from("1")
    }

    #[test]
    fn test_envelope_priority_order() {
        let body = json!({
            "data": [{"address": "from-data"}],
            "tokens": [{"address": "from-tokens"}],
        });
        let extracted = extract_entries(body, &list_provider(), &eth()).unwrap();
        assert_eq!(extracted.records.len(), 1);
        assert_eq!(extracted.records[0]["address"], "from-tokens");
    }

    #[test]
    fn test_results_and_recommended_tokens_envelopes() {
        let results = json!({"results": [{"address": "a"}, {"address": "b"}]});
        assert_eq!(
            extract_entries(results, &list_provider(), &eth()).unwrap().records.len(),
            2
        );

        let recommended = json!({"recommendedTokens": [{"address": "a"}]});
        assert_eq!(
            extract_entries(recommended, &list_provider(), &eth()).unwrap().records.len(),
            1
        );
    }

    #[test]
    fn test_bare_array_body() {
        let body = json!([{"address": "a"}, {"address": "b"}, {"address": "c"}]);
        let extracted = extract_entries(body, &list_provider(), &eth()).unwrap();
        assert_eq!(extracted.records.len(), 3);
        assert!(extracted.skipped.is_empty());
    }

    #[test]
    fn test_object_without_envelope_is_malformed() {
        let body = json!({"name": "Some List", "version": {"major": 1}});
        let err = extract_entries(body, &list_provider(), &eth()).unwrap_err();
        assert_eq!(err, ShapeError::MalformedPayload { found: "object" });
    }

    #[test]
    fn test_scalar_body_is_malformed() {
        let err = extract_entries(json!("rate limited"), &list_provider(), &eth()).unwrap_err();
        assert_eq!(err, ShapeError::MalformedPayload { found: "string" });
    }

    #[test]
    fn test_map_layout_projects_values() {
        let provider = list_provider().with_entries(EntryLayout::Map);
        let body = json!({"tokens": {
            "0xaaa": {"address": "0xaaa", "symbol": "AAA"},
            "0xbbb": {"address": "0xbbb", "symbol": "BBB"},
        }});
        let extracted = extract_entries(body, &provider, &eth()).unwrap();

        let mut symbols: Vec<&str> = extracted
            .records
            .iter()
            .map(|r| r["symbol"].as_str().unwrap())
            .collect();
        symbols.sort();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_map_layout_without_envelope() {
        let provider = list_provider().with_entries(EntryLayout::Map);
        let body = json!({"0xaaa": {"address": "0xaaa"}});
        assert_eq!(extract_entries(body, &provider, &eth()).unwrap().records.len(), 1);
    }

    #[test]
    fn test_chain_keyed_descends_into_current_chain() {
        let provider = list_provider().with_envelope(Envelope::ChainKeyed);
        let body = json!({"tokens": {
            "1": [{"address": "eth-token"}],
            "56": [{"address": "bsc-token"}, {"address": "bsc-token-2"}],
        }});

        let eth_records = extract_entries(body.clone(), &provider, &eth()).unwrap();
        assert_eq!(eth_records.records.len(), 1);
        assert_eq!(eth_records.records[0]["address"], "eth-token");

        let bsc_records = extract_entries(body, &provider, &ChainId::from("56")).unwrap();
        assert_eq!(bsc_records.records.len(), 2);
    }

    #[test]
    fn test_chain_keyed_missing_chain_is_malformed() {
        let provider = list_provider().with_envelope(Envelope::ChainKeyed);
        let body = json!({"tokens": {"56": [{"address": "bsc-token"}]}});
        assert!(extract_entries(body, &provider, &eth()).is_err());
    }

    #[test]
    fn test_non_record_entries_are_skipped_not_fatal() {
        let body = json!({"tokens": [
            {"address": "a"},
            "0xdeadbeef",
            null,
            {"address": "b"},
        ]});
        let extracted = extract_entries(body, &list_provider(), &eth()).unwrap();

        assert_eq!(extracted.records.len(), 2);
        assert_eq!(extracted.skipped.len(), 2);
        assert_eq!(extracted.skipped[0].index, 1);
        assert_eq!(extracted.skipped[0].kind, "string");
        assert_eq!(extracted.skipped[1].kind, "null");
    }
}
