//! Record Normalizer
//!
//! Converts one raw provider record into a canonical [`Token`], or rejects it
//! with a reason. A rejection only ever drops that one record; sibling records
//! from the same payload are unaffected.

use serde_json::Value;
use thiserror::Error;

use super::address::{canonicalize_address, AddressError};
use super::chain::ChainId;
use super::extractor::RawRecord;
use super::provider::{ChainIdMode, ProviderConfig};
use super::secondary_ids::SecondaryIdTable;
use super::token::{ListedIn, Token};

/// Embedded chain id field spellings
pub const CHAIN_ID_FIELDS: &[&str] = &["chainId", "chain_id"];

/// Decimals field spellings, highest priority first
pub const DECIMALS_FIELDS: &[&str] = &["tokenDecimal", "decimals"];

/// Logo field spellings, highest priority first
pub const LOGO_FIELDS: &[&str] = &["logoURI", "icon", "image"];

/// Why a single record was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} has wrong type: {found}")]
    WrongType {
        field: &'static str,
        found: &'static str,
    },

    #[error("Empty address")]
    EmptyAddress,

    #[error("{0}")]
    InvalidAddress(AddressError),

    #[error("Chain id mismatch: expected {expected}, record says {found}")]
    ChainIdMismatch { expected: ChainId, found: ChainId },

    #[error("Record carries no chain id")]
    MissingChainId,

    #[error("Invalid decimals: {0}")]
    InvalidDecimals(String),
}

/// Per-record outcome
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Accepted(Token),
    Rejected(RejectReason),
}

/// A dropped record with enough context to diagnose it
#[derive(Debug, Clone)]
pub struct Rejection {
    pub chain_id: ChainId,
    pub raw_address: Option<String>,
    pub reason: RejectReason,
}

/// Tokens accepted for one (provider, chain) plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct NormalizedChain {
    pub tokens: Vec<Token>,
    pub rejected: Vec<Rejection>,
}

/// Normalize a single raw record fetched for `chain_id`.
pub fn normalize_record(
    record: &RawRecord,
    chain_id: &ChainId,
    mode: ChainIdMode,
    secondary_ids: &SecondaryIdTable,
) -> RecordOutcome {
    match try_normalize(record, chain_id, mode, secondary_ids) {
        Ok(token) => RecordOutcome::Accepted(token),
        Err(reason) => RecordOutcome::Rejected(reason),
    }
}

/// Normalize every record of one (provider, chain) payload, logging each drop.
pub fn normalize_chain(
    records: &[RawRecord],
    provider: &ProviderConfig,
    chain_id: &ChainId,
    secondary_ids: &SecondaryIdTable,
) -> NormalizedChain {
    let mut normalized = NormalizedChain::default();

    for record in records {
        match normalize_record(record, chain_id, provider.chain_id, secondary_ids) {
            RecordOutcome::Accepted(token) => normalized.tokens.push(token),
            RecordOutcome::Rejected(reason) => {
                let raw_address = record
                    .get("address")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let raw_record = Value::Object(record.clone());
                tracing::warn!(
                    provider = %provider.name,
                    chain = %chain_id,
                    address = raw_address.as_deref().unwrap_or("<none>"),
                    record = %raw_record,
                    "Record rejected: {}",
                    reason
                );
                normalized.rejected.push(Rejection {
                    chain_id: chain_id.clone(),
                    raw_address,
                    reason,
                });
            }
        }
    }

    normalized
}

fn try_normalize(
    record: &RawRecord,
    chain_id: &ChainId,
    mode: ChainIdMode,
    secondary_ids: &SecondaryIdTable,
) -> Result<Token, RejectReason> {
    let raw_address = required_str(record, "address")?;
    if raw_address.trim().is_empty() {
        return Err(RejectReason::EmptyAddress);
    }
    let address = canonicalize_address(raw_address).map_err(RejectReason::InvalidAddress)?;

    check_chain_id(record, chain_id, mode)?;

    let decimals = match first_present(record, DECIMALS_FIELDS) {
        Some(value) => coerce_decimals(value)?,
        None => return Err(RejectReason::MissingField("decimals")),
    };

    let symbol = required_str(record, "symbol")?.to_string();
    let name = required_str(record, "name")?.to_string();

    let logo_uri = LOGO_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|logo| !logo.trim().is_empty())
        .map(repair_logo_uri);

    let secondary_id = secondary_ids
        .lookup(chain_id, &address)
        .map(str::to_string);

    Ok(Token {
        symbol,
        name,
        address,
        decimals,
        chain_id: chain_id.clone(),
        logo_uri,
        secondary_id,
        listed_in: ListedIn::new(),
    })
}

fn check_chain_id(
    record: &RawRecord,
    chain_id: &ChainId,
    mode: ChainIdMode,
) -> Result<(), RejectReason> {
    let embedded = CHAIN_ID_FIELDS
        .iter()
        .filter_map(|field| record.get(*field))
        .find_map(ChainId::from_json);

    match embedded {
        Some(found) if mode.verifies() && &found != chain_id => Err(RejectReason::ChainIdMismatch {
            expected: chain_id.clone(),
            found,
        }),
        Some(_) => Ok(()),
        None if mode.assumes_when_absent() => Ok(()),
        None => Err(RejectReason::MissingChainId),
    }
}

fn first_present<'a>(record: &'a RawRecord, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| !value.is_null())
}

fn required_str<'a>(record: &'a RawRecord, field: &'static str) -> Result<&'a str, RejectReason> {
    match record.get(field) {
        None | Some(Value::Null) => Err(RejectReason::MissingField(field)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(RejectReason::WrongType {
            field,
            found: match other {
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::Array(_) => "array",
                _ => "object",
            },
        }),
    }
}

/// Coerce a decimals value that may be a number or a numeric string.
pub fn coerce_decimals(value: &Value) -> Result<u32, RejectReason> {
    let invalid = || RejectReason::InvalidDecimals(value.to_string());

    match value {
        Value::Number(n) => {
            if let Some(int) = n.as_u64() {
                return u32::try_from(int).map_err(|_| invalid());
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
                _ => Err(invalid()),
            }
        }
        Value::String(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Rewrite protocol-relative logo URLs (`//host/path`) to explicit https.
pub fn repair_logo_uri(logo: &str) -> String {
    let logo = logo.trim();
    if logo.starts_with("//") {
        format!("https:{logo}")
    } else {
        logo.to_string()
    }
}
