use anyhow::{Context, Result};
use clap::Parser;
use feed_core::logging::init_tracing;
use feed_core::Config;
use tracing::debug;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = cli::Cli::parse();

    let config =
        Config::from_env_with(cli.overrides()).context("Failed to load configuration")?;
    debug!(env = %config.app.env, backend = ?config.store.backend, "Configuration loaded");

    let client = cli::open_client(&config).await?;

    cli::run(cli.command, &client, config.content.default_page_size).await
}
