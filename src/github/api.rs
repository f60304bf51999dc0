//! GitHub REST API client.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::client::{LatestRelease, ReleaseSource};
use super::error::GithubError;
use crate::config::UpdaterConfig;

const USER_AGENT: &str = concat!("extensions-updater/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client shared by every fetch of a run.
pub struct GithubClient {
    client: Client,
    api_url: String,
    username: String,
    token: SecretString,
}

impl GithubClient {
    pub fn new(config: &UpdaterConfig) -> Result<Self, GithubError> {
        Self::with_api_url(
            config.api_url.clone(),
            config.github_username.clone(),
            SecretString::from(config.github_token.expose_secret().to_string()),
        )
    }

    pub fn with_api_url(
        api_url: String,
        username: String,
        token: SecretString,
    ) -> Result<Self, GithubError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self::with_http_client(client, api_url, username, token))
    }

    /// Wrap an already configured HTTP client.
    pub fn with_http_client(
        client: Client,
        api_url: String,
        username: String,
        token: SecretString,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            username,
            token,
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(self.token.expose_secret()))
    }
}

impl ReleaseSource for GithubClient {
    async fn latest_release(&self, repo: &str) -> Result<Option<LatestRelease>, GithubError> {
        let url = format!("{}/{}/releases/latest", self.api_url, repo);
        debug!(repo, url = %url, "fetching latest release");

        let response = self.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            debug!(repo, status = %response.status(), "no latest release");
            return Ok(None);
        }

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn download_archive(&self, url: &str, dest: &Path) -> Result<u64, GithubError> {
        debug!(url, dest = %dest.display(), "downloading archive");

        let mut file = tokio::fs::File::create(dest).await?;
        let mut response = self.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GithubError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, bytes = written, "archive downloaded");
        Ok(written)
    }
}
