//! Domain Layer - Normalization, merge, and trust classification
//!
//! Pure types and logic with no I/O. Data flows leaf-first:
//!
//! - `extractor`: locate raw token records inside a provider payload
//! - `normalizer`: turn one raw record into a canonical `Token` or a rejection
//! - `merger`: fold every provider's tokens into one catalog per chain
//! - `classifier`: split the catalog into all-observed and trusted lists
//!
//! Supporting types live in `chain`, `address`, `token`, `provider`, and
//! `secondary_ids`.

pub mod address;
pub mod chain;
pub mod classifier;
pub mod extractor;
pub mod merger;
pub mod normalizer;
pub mod provider;
pub mod secondary_ids;
pub mod token;

pub use address::{canonicalize_address, merge_key, to_checksum_address, AddressError};
pub use chain::{chain_file_stem, ChainId};
pub use classifier::{
    classify, classify_with_threshold, ChainTokens, Classification, MIN_TRUSTED_SOURCES,
};
pub use extractor::{extract_entries, Extracted, RawRecord, ShapeError};
pub use merger::{
    CatalogMerger, LogoPrecedence, MergePolicy, MergeStats, MergedCatalog, NativePolicy,
};
pub use normalizer::{
    normalize_chain, normalize_record, NormalizedChain, RecordOutcome, RejectReason,
};
pub use provider::{ChainIdMode, EntryLayout, Envelope, ProviderConfig, UrlKey};
pub use secondary_ids::SecondaryIdTable;
pub use token::{ListedIn, Token};
