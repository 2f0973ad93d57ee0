//! stagehand - deployment bootstrap manifest generator CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stagehand_cli::Cli;
use stagehand_cli::cmd;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.into_config()?;

    cmd::generate::generate(&config).await
}
