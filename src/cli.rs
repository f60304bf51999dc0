//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{CatalogCmd, UpdateCmd};

#[derive(Parser)]
#[command(name = "updater")]
#[command(about = "Mirror extension releases from GitHub and publish a static catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the latest releases, unpack new versions and rewrite the indexes
    Update(UpdateCmd),

    /// Rebuild the global index.json from the per-extension indexes on disk
    Catalog(CatalogCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Update(cmd) => cmd.run().await,
            Command::Catalog(cmd) => cmd.run().await,
        }
    }
}
