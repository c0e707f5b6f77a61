//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching tokenlists.toml structure.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::coingecko::DEFAULT_COINS_LIST_URL;
use crate::adapters::http::HttpFetcherConfig;
use crate::domain::{
    ChainId, LogoPrecedence, MergePolicy, NativePolicy, ProviderConfig, MIN_TRUSTED_SOURCES,
};

/// Main configuration structure matching tokenlists.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub merge: MergeSection,
    #[serde(default)]
    pub trust: TrustSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub coingecko: CoinGeckoSection,
    /// Provider table, in merge order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// HTTP fetching configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries on 429/5xx before a provider is abandoned
    pub max_retries: u32,
    /// Wait when the server sends no Retry-After header
    pub default_retry_delay_secs: u64,
    /// Cap on any single Retry-After wait
    pub max_retry_delay_secs: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 60,
            default_retry_delay_secs: 1,
            max_retry_delay_secs: 120,
        }
    }
}

/// Merge configuration section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeSection {
    /// "collapse" or "drop"
    pub native: NativePolicy,
    /// Providers whose logos win, best first
    pub logo_precedence: Vec<String>,
}

/// Trust configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrustSection {
    /// Distinct providers required for a token to be trusted
    pub min_sources: usize,
}

impl Default for TrustSection {
    fn default() -> Self {
        Self {
            min_sources: MIN_TRUSTED_SOURCES,
        }
    }
}

/// Output configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Output directory (`~` is expanded)
    pub dir: String,
    /// Also write the all-observed set under `observed/`
    pub write_observed: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: "tokenlists".to_string(),
            write_observed: false,
        }
    }
}

impl OutputSection {
    /// Output directory with `~` expanded
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).into_owned())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// CoinGecko id lookup configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoinGeckoSection {
    /// Attach CoinGecko ids to tokens
    pub enabled: bool,
    /// Coin listing endpoint (must include platforms)
    pub url: String,
    /// Optional demo-plan API key
    pub api_key: Option<String>,
    /// Chain id -> CoinGecko platform slug
    pub platforms: BTreeMap<ChainId, String>,
}

impl Default for CoinGeckoSection {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_COINS_LIST_URL.to_string(),
            api_key: None,
            platforms: BTreeMap::new(),
        }
    }
}

impl CoinGeckoSection {
    /// Get API key with environment variable fallback
    /// Checks COINGECKO_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("COINGECKO_API_KEY").ok().filter(|key| !key.is_empty())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[providers]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "provider name cannot be empty".to_string(),
                ));
            }
            if !names.insert(provider.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate provider name: {}",
                    provider.name
                )));
            }
            if provider.url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "provider {} has an empty url",
                    provider.name
                )));
            }
            if provider.chains.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "provider {} has no chains",
                    provider.name
                )));
            }
        }

        for name in &self.merge.logo_precedence {
            if !names.contains(name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "logo_precedence names unknown provider: {}",
                    name
                )));
            }
        }

        if self.fetch.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "max_retries must be > 0".to_string(),
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.trust.min_sources == 0 {
            return Err(ConfigError::ValidationError(
                "min_sources must be >= 1".to_string(),
            ));
        }

        if self.output.dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "output dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Merge policy with logo precedence completed by provider order
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            native: self.merge.native,
            logo: LogoPrecedence::new(
                &self.merge.logo_precedence,
                self.providers.iter().map(|p| p.name.as_str()),
            ),
        }
    }
}

// Conversion from Config to the HTTP adapter's settings
impl From<&FetchSection> for HttpFetcherConfig {
    fn from(fetch: &FetchSection) -> Self {
        HttpFetcherConfig {
            timeout: Duration::from_secs(fetch.timeout_secs),
            max_retries: fetch.max_retries,
            default_retry_delay: Duration::from_secs(fetch.default_retry_delay_secs),
            max_retry_delay: Duration::from_secs(fetch.max_retry_delay_secs),
            headers: Vec::new(),
        }
    }
}
