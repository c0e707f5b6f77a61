//! Chain Identifiers
//!
//! Blockchain network ids and the human-readable names used for output files.
//! Non-EVM networks use negative ids (Solana = -1, NEAR = -2).

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Opaque chain identifier.
///
/// Providers emit chain ids as JSON numbers or strings; both forms compare by
/// their decimal text, so `1` and `"1"` are the same chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret an embedded chain id value from a raw provider record.
    ///
    /// Returns `None` for values that can't name a chain (objects, arrays,
    /// booleans, empty strings).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Some(Self(i.to_string())),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
                    Some(Self((f as i64).to_string()))
                }
                _ => Some(Self(n.to_string())),
            },
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.as_str())),
            _ => None,
        }
    }

    /// Human-readable network name, if the chain is known.
    pub fn name(&self) -> Option<&'static str> {
        CHAIN_NAMES
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for ChainId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

struct ChainIdVisitor;

impl<'de> de::Visitor<'de> for ChainIdVisitor {
    type Value = ChainId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a chain id as an integer or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ChainId, E> {
        Ok(ChainId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ChainId, E> {
        Ok(ChainId(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ChainId, E> {
        if v.trim().is_empty() {
            return Err(E::custom("empty chain id"));
        }
        Ok(ChainId::new(v))
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ChainIdVisitor)
    }
}

/// Known chain ids and their names, used to name output files.
pub const CHAIN_NAMES: &[(&str, &str)] = &[
    ("1", "ethereum"),
    ("10", "optimism"),
    ("100", "gnosis"),
    ("10000", "smartbch"),
    ("-1", "solana"),
    ("-2", "near"),
    ("1024", "clover"),
    ("11297108109", "palm"),
    ("122", "fuse"),
    ("128", "heco"),
    ("1284", "moonbeam"),
    ("1285", "moonriver"),
    ("1287", "moonbase"),
    ("1313161554", "aurora"),
    ("137", "polygon"),
    ("1666600000", "harmony"),
    ("1666700000", "harmony-testnet"),
    ("20", "elastos"),
    ("25", "cronos"),
    ("250", "ftm"),
    ("256", "heco-testnet"),
    ("288", "boba"),
    ("3", "ropsten"),
    ("321", "kcc"),
    ("361", "theta"),
    ("4", "rinkeby"),
    ("40", "telos"),
    ("4002", "ftmtest"),
    ("42", "kovan"),
    ("42161", "arbitrum"),
    ("42220", "celo"),
    ("43113", "fuji"),
    ("43114", "avax"),
    ("4689", "iotex"),
    ("592", "astar"),
    ("5", "goerli"),
    ("56", "bsc"),
    ("1818", "cube"),
    ("65", "okex-testnet"),
    ("66", "okex"),
    ("70", "hoo"),
    ("80001", "mumbai"),
    ("82", "meter"),
    ("88", "tomochain"),
    ("97", "bsc-testnet"),
    ("9001", "evmos"),
];

/// File stem for a chain's output file (`ethereum`, `bsc`, ...).
///
/// Chains missing from [`CHAIN_NAMES`] fall back to `chain-<id>`.
pub fn chain_file_stem(chain_id: &ChainId) -> String {
    match chain_id.name() {
        Some(name) => name.to_string(),
        None => format!("chain-{}", chain_id.as_str()),
    }
}
