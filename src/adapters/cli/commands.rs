//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the token list aggregator.

use clap::{Parser, Subcommand};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::coingecko::{CoinGeckoIdSource, API_KEY_HEADER};
use crate::adapters::http::{HttpFetcherConfig, HttpTokenListFetcher};
use crate::adapters::output::JsonCatalogWriter;
use crate::application::{AggregationPipeline, ProviderStatus, RunReport};
use crate::config::{load_config, Config};
use crate::domain::{chain_file_stem, SecondaryIdTable};
use crate::ports::sink::CatalogSink;

/// Tokenlists - Multi-chain token list aggregator
#[derive(Parser, Debug)]
#[command(
    name = "tokenlists",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Multi-chain token list aggregator",
    long_about = "Collects token lists from many providers, merges them per chain by address, \
                  and publishes the tokens listed by at least two independent providers."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch every provider and write the trusted token lists
    Collect(CollectCmd),

    /// Show the configured providers
    Providers(ProvidersCmd),
}

impl Command {
    fn config_path(&self) -> &PathBuf {
        match self {
            Command::Collect(cmd) => &cmd.config,
            Command::Providers(cmd) => &cmd.config,
        }
    }
}

/// Collect token lists
#[derive(Parser, Debug)]
pub struct CollectCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/tokenlists.toml")]
    pub config: PathBuf,

    /// Override output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Also write the all-observed token lists
    #[arg(long)]
    pub observed: bool,

    /// Skip the CoinGecko id lookup
    #[arg(long)]
    pub no_coingecko: bool,

    /// Collect and report without writing any files
    #[arg(long)]
    pub dry_run: bool,
}

/// List providers
#[derive(Parser, Debug)]
pub struct ProvidersCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/tokenlists.toml")]
    pub config: PathBuf,
}

/// Execute the parsed command
pub async fn execute(app: CliApp) -> Result<()> {
    let config_path = app.command.config_path().clone();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    // Initialize logging based on flags, falling back to the configured level
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Collect(cmd) => collect_command(cmd, config).await,
        Command::Providers(_) => providers_command(&config),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, default_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        default_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Handle collect command
async fn collect_command(cmd: CollectCmd, config: Config) -> Result<()> {
    tracing::info!("Starting token list collection...");

    let fetch_config = HttpFetcherConfig::from(&config.fetch);
    let fetcher = HttpTokenListFetcher::with_config(fetch_config.clone())
        .context("Failed to create HTTP client")?;

    let secondary_ids = if config.coingecko.enabled && !cmd.no_coingecko {
        load_secondary_ids(&config, fetch_config).await?
    } else {
        tracing::info!("CoinGecko id lookup disabled");
        SecondaryIdTable::new()
    };

    let pipeline = AggregationPipeline::new(
        config.providers.clone(),
        Arc::new(fetcher),
        secondary_ids,
        config.merge_policy(),
        config.trust.min_sources,
    )
    .context("Failed to create aggregation pipeline")?;

    let output = pipeline.run().await;
    print_report(&output.report);

    if cmd.dry_run {
        println!("\nDry run: no files written");
        return Ok(());
    }

    let dir = cmd.output.unwrap_or_else(|| config.output.resolved_dir());
    let writer = JsonCatalogWriter::new(&dir)
        .with_observed(cmd.observed || config.output.write_observed);
    let summary = writer
        .write(&output.classification)
        .with_context(|| format!("Failed to write token lists to {}", dir.display()))?;

    println!("\nWrote {} files to {}", summary.files.len(), dir.display());
    Ok(())
}

/// Build the CoinGecko id table; a failed listing yields an empty table
async fn load_secondary_ids(
    config: &Config,
    fetch_config: HttpFetcherConfig,
) -> Result<SecondaryIdTable> {
    let mut fetcher = HttpTokenListFetcher::with_config(fetch_config)
        .context("Failed to create CoinGecko client")?;
    if let Some(key) = config.coingecko.get_api_key() {
        fetcher = fetcher.with_header(API_KEY_HEADER, key);
    }

    let source = CoinGeckoIdSource::new(
        Arc::new(fetcher),
        config.coingecko.url.clone(),
        &config.coingecko.platforms,
    );
    Ok(source.load_or_empty().await)
}

/// Handle providers command
fn providers_command(config: &Config) -> Result<()> {
    println!(
        "{:<20} {:>6}  {:<8} {:<12} {:<5} {:<7} URL",
        "PROVIDER", "CHAINS", "KEY", "ENVELOPE", "ENTRY", "CHAINID"
    );
    for provider in &config.providers {
        println!(
            "{:<20} {:>6}  {:<8} {:<12} {:<5} {:<7} {}",
            provider.name,
            provider.chains.len(),
            format!("{:?}", provider.url_key).to_lowercase(),
            format!("{:?}", provider.envelope).to_lowercase(),
            format!("{:?}", provider.entries).to_lowercase(),
            format!("{:?}", provider.chain_id).to_lowercase(),
            provider.url
        );
    }
    println!("\n{} providers", config.providers.len());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "\n{:<20} {:<8} {:>9} {:>9} {:>9}  FAILED CHAINS",
        "PROVIDER", "STATUS", "ACCEPTED", "REJECTED", "NEW"
    );
    for provider in &report.providers {
        let status = match &provider.status {
            ProviderStatus::Complete => "ok",
            ProviderStatus::Partial => "partial",
            ProviderStatus::Aborted(_) => "aborted",
        };
        let failed: Vec<&str> = provider
            .failed_chains
            .iter()
            .map(|f| f.chain_id.as_str())
            .collect();
        println!(
            "{:<20} {:<8} {:>9} {:>9} {:>9}  {}",
            provider.name,
            status,
            provider.accepted,
            provider.rejected,
            provider.merge.inserted,
            failed.join(",")
        );
    }

    println!("\n{:<24} {:>8}", "CHAIN", "TRUSTED");
    for (chain_id, count) in report.chains_by_count() {
        println!("{:<24} {:>8}", chain_file_stem(chain_id), count);
    }

    println!(
        "\n{} trusted of {} observed tokens, {} CoinGecko ids, {:.1}s",
        report.trusted_count,
        report.observed_count,
        report.secondary_ids,
        report.duration_secs()
    );

    for provider in report.aborted_providers() {
        if let ProviderStatus::Aborted(reason) = &provider.status {
            tracing::error!("[{}] contributed nothing: {}", provider.name, reason);
        }
    }
}
