//! Token Addresses
//!
//! Canonical address forms and merge keys.
//!
//! EVM addresses (`0x` prefix) are canonicalized to their EIP-55 mixed-case
//! checksum form. Everything else (Solana mints, NEAR account ids) is only
//! trimmed. Checksum casing differs between providers, so merging keys on the
//! fully lower-cased canonical address.

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Prefix marking an EVM-style hex address
pub const EVM_PREFIX: &str = "0x";

/// Canonical native-asset sentinel (lower-cased merge key form)
pub const NATIVE_SENTINEL: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Zero address, used by several aggregators for the gas token
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Alternate native-asset spellings that collapse onto [`NATIVE_SENTINEL`]
pub const NATIVE_ALIASES: &[&str] = &[
    ZERO_ADDRESS,
    // Polygon native MATIC token contract
    "0x0000000000000000000000000000000000001010",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address is empty")]
    Empty,

    #[error("Invalid EVM address: {0}")]
    InvalidEvm(String),
}

/// Canonicalize a raw provider address.
///
/// Idempotent: canonicalizing an already-canonical address returns it unchanged.
pub fn canonicalize_address(raw: &str) -> Result<String, AddressError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }

    if trimmed.starts_with(EVM_PREFIX) {
        // Some lists append `#<tag>` fragments to EVM addresses
        let bare = trimmed.split('#').next().unwrap_or(trimmed).trim();
        return to_checksum_address(bare);
    }

    Ok(trimmed.to_string())
}

/// EIP-55 mixed-case checksum encoding of a `0x`-prefixed hex address.
pub fn to_checksum_address(address: &str) -> Result<String, AddressError> {
    let hex_part = address
        .strip_prefix(EVM_PREFIX)
        .ok_or_else(|| AddressError::InvalidEvm(address.to_string()))?;

    let bytes = match hex::decode(hex_part) {
        Ok(bytes) if bytes.len() == 20 => bytes,
        _ => return Err(AddressError::InvalidEvm(address.to_string())),
    };

    let lower = hex::encode(bytes);
    let mut hasher = Keccak::v256();
    hasher.update(lower.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    let mut result = String::with_capacity(42);
    result.push_str(EVM_PREFIX);
    for (i, c) in lower.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 {
            (hash[i / 2] >> 4) & 0x0f
        } else {
            hash[i / 2] & 0x0f
        };
        if hash_nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }
    Ok(result)
}

/// Merge key for a canonical address: trimmed and fully lower-cased.
pub fn merge_key(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Whether a merge key names the chain's native asset under any known spelling.
pub fn is_native_sentinel(key: &str) -> bool {
    key == NATIVE_SENTINEL || NATIVE_ALIASES.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDT_CHECKSUM: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    #[test]
    fn test_eip55_known_vectors() {
        // EIP-55 reference vectors
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let lower = expected.to_lowercase();
            assert_eq!(to_checksum_address(&lower).unwrap(), expected);
        }
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize_address(USDT_CHECKSUM).unwrap();
        let twice = canonicalize_address(&once).unwrap();
        assert_eq!(once, USDT_CHECKSUM);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_canonicalize_any_casing_yields_same_checksum() {
        let lower = "0xdac17f958d2ee523a2206206994597c13d831ec7";
        let upper = "0xDAC17F958D2EE523A2206206994597C13D831EC7";
        assert_eq!(canonicalize_address(lower).unwrap(), USDT_CHECKSUM);
        assert_eq!(canonicalize_address(upper).unwrap(), USDT_CHECKSUM);
    }

    #[test]
    fn test_canonicalize_trims_and_strips_fragment() {
        let raw = "  0xdac17f958d2ee523a2206206994597c13d831ec7#bridged ";
        assert_eq!(canonicalize_address(raw).unwrap(), USDT_CHECKSUM);
    }

    #[test]
    fn test_non_evm_addresses_only_trimmed() {
        let mint = " EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v\n";
        assert_eq!(
            canonicalize_address(mint).unwrap(),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        );
        assert_eq!(canonicalize_address("wrap.near").unwrap(), "wrap.near");
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert_eq!(canonicalize_address("   "), Err(AddressError::Empty));
        assert!(matches!(
            canonicalize_address("0x1234"),
            Err(AddressError::InvalidEvm(_))
        ));
        assert!(matches!(
            canonicalize_address("0xzz17f958d2ee523a2206206994597c13d831ec7"),
            Err(AddressError::InvalidEvm(_))
        ));
    }

    #[test]
    fn test_native_sentinels() {
        assert!(is_native_sentinel(NATIVE_SENTINEL));
        assert!(is_native_sentinel(&merge_key(
            "0x0000000000000000000000000000000000001010"
        )));
        assert!(!is_native_sentinel(&merge_key(USDT_CHECKSUM)));
    }
}
