//! Tokenlists - Multi-chain token list aggregator
//!
//! Collects token lists from many providers and publishes the tokens that at
//! least two of them agree on.

use anyhow::Result;

use tokenlists::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in tokenlists.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
