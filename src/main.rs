//! Extensions updater - mirror extension releases and publish a static catalog.

mod cli;
mod commands;
mod config;
mod descriptors;
mod github;
mod sync;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Controlled by RUST_LOG, defaulting to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
