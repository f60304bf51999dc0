//! Run configuration.
//!
//! Values come from command-line flags backed by environment variables
//! (`GH_USERNAME`, `GH_TOKEN`, `HOST`, ...). The resolved struct is built
//! once at job start and passed down explicitly.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub const DEFAULT_HOST: &str = "http://localhost:81";
pub const DEFAULT_API_URL: &str = "https://api.github.com/repos";

/// Everything one update run needs.
#[derive(Debug)]
pub struct UpdaterConfig {
    pub github_username: String,
    pub github_token: SecretString,
    /// Base URL of the repos API (`.../repos`).
    pub api_url: String,
    /// Public base URL the output tree is served from.
    pub host: String,
    pub extensions_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Maximum number of concurrent fetches.
    pub concurrency: usize,
    /// Upper bound on one extension's release lookup plus download.
    pub fetch_timeout: Duration,
}

impl UpdaterConfig {
    /// Check values that would otherwise only fail halfway through a run.
    pub fn validate(&self) -> Result<()> {
        if self.github_username.is_empty() {
            bail!("GitHub username is empty (set GH_USERNAME)");
        }
        if self.github_token.expose_secret().is_empty() {
            bail!("GitHub token is empty (set GH_TOKEN)");
        }
        Url::parse(&self.host).with_context(|| format!("Invalid host URL: {}", self.host))?;
        Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;
        if self.concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }
        if self.fetch_timeout.is_zero() {
            bail!("Fetch timeout must be positive");
        }
        Ok(())
    }
}
