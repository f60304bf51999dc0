//! Update command - mirror the latest releases and republish the catalog.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use secrecy::SecretString;
use tracing::info;

use crate::config::{DEFAULT_API_URL, DEFAULT_HOST, UpdaterConfig};
use crate::descriptors::load_descriptors;
use crate::github::{GithubClient, ReleaseSource};
use crate::sync;

#[derive(Args)]
pub struct UpdateCmd {
    /// GitHub user the API requests authenticate as
    #[arg(long, env = "GH_USERNAME")]
    pub github_username: String,

    /// GitHub token for that user
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Public base URL the output directory is served from
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// GitHub repos API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory containing one YAML descriptor per extension
    #[arg(long, env = "EXTENSIONS_DIR", default_value = "extensions")]
    pub extensions_dir: PathBuf,

    /// Directory to publish extensions and indexes into
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub output_dir: PathBuf,

    /// Number of extensions to fetch concurrently
    #[arg(long, short = 'j', default_value = "8")]
    pub concurrency: usize,

    /// Seconds allowed for one extension's release lookup and download
    #[arg(long, default_value = "300")]
    pub fetch_timeout: u64,
}

impl UpdateCmd {
    pub async fn run(&self) -> Result<()> {
        let config = self.config();
        config.validate()?;

        let client = GithubClient::new(&config).context("Failed to build GitHub client")?;
        self.update(&client, &config).await
    }

    async fn update<S: ReleaseSource>(&self, source: &S, config: &UpdaterConfig) -> Result<()> {
        let started = Instant::now();
        info!("extensions update started");

        let descriptors = load_descriptors(&config.extensions_dir)?;
        info!(
            extensions = descriptors.len(),
            dir = %config.extensions_dir.display(),
            "loaded descriptors"
        );

        let report = sync::run(source, descriptors, config, Utc::now())
            .await
            .context("Extensions update failed")?;

        info!(
            total = report.total,
            resolved = report.resolved,
            downloaded = report.downloaded,
            unpacked = report.unpacked,
            published = report.published,
            failed = report.failed,
            catalog_written = report.catalog_written,
            elapsed_secs = started.elapsed().as_secs(),
            "extensions update completed"
        );

        Ok(())
    }

    fn config(&self) -> UpdaterConfig {
        UpdaterConfig {
            github_username: self.github_username.clone(),
            github_token: SecretString::from(self.github_token.clone()),
            api_url: self.api_url.clone(),
            host: self.host.clone(),
            extensions_dir: self.extensions_dir.clone(),
            output_dir: self.output_dir.clone(),
            concurrency: self.concurrency,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
        }
    }
}
