//! Catalog command - rebuild the global index from published extensions.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::sync::{load_published, write_catalog};

#[derive(Args)]
pub struct CatalogCmd {
    /// Directory holding the published extensions
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub output_dir: PathBuf,
}

impl CatalogCmd {
    pub async fn run(&self) -> Result<()> {
        if !self.output_dir.is_dir() {
            bail!("Output directory not found: {}", self.output_dir.display());
        }

        let packages =
            load_published(&self.output_dir).context("Failed to read published extensions")?;
        info!(packages = packages.len(), "rebuilding catalog");

        write_catalog(&self.output_dir, packages, Utc::now())
            .context("Failed to write catalog")?;

        Ok(())
    }
}
