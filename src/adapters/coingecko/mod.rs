//! CoinGecko Adapter
//!
//! Builds the secondary-id table from CoinGecko's coin listing.

mod ids;

pub use ids::{
    build_secondary_ids, CoinGeckoIdSource, CoinListing, API_KEY_HEADER, DEFAULT_COINS_LIST_URL,
};
