//! Release source trait and common types.

use std::future::Future;
use std::path::Path;

use serde::Deserialize;

use super::error::GithubError;

/// The subset of a GitHub release the updater relies on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LatestRelease {
    pub tag_name: Option<String>,
    pub zipball_url: Option<String>,
}

/// Where releases come from.
///
/// Implemented by [`super::GithubClient`]; tests substitute in-memory sources.
pub trait ReleaseSource: Send + Sync {
    /// Latest release of `repo` (`owner/repo`), or `None` when the API has none.
    fn latest_release(
        &self,
        repo: &str,
    ) -> impl Future<Output = Result<Option<LatestRelease>, GithubError>> + Send;

    /// Stream the archive at `url` into `dest`, truncating it first.
    ///
    /// Returns the number of bytes written.
    fn download_archive(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, GithubError>> + Send;
}
