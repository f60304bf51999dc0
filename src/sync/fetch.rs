//! Latest-release resolution and archive download for one extension.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::archive::{is_safe_version_tag, is_valid_archive};
use super::error::SyncError;
use crate::github::ReleaseSource;
use crate::types::ExtensionDescriptor;

/// A release resolved for this run, with its archive on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelease {
    pub version: String,
    pub zipball_url: String,
    /// `<output>/<repo_name>`
    pub repo_dir: PathBuf,
    /// `<output>/<repo_name>/<version>.zip`
    pub archive_path: PathBuf,
    /// False when a valid archive was already present.
    pub downloaded: bool,
}

impl ResolvedRelease {
    /// `<output>/<repo_name>/<version>`
    pub fn version_dir(&self) -> PathBuf {
        self.repo_dir.join(&self.version)
    }
}

/// Resolve the latest release of `descriptor` and make sure its archive is on disk.
///
/// Returns `Ok(None)` when GitHub reports no usable release. An existing
/// archive is reused only if it is still a valid zip.
pub async fn fetch_archive<S: ReleaseSource>(
    source: &S,
    descriptor: &ExtensionDescriptor,
    output_dir: &Path,
) -> Result<Option<ResolvedRelease>, SyncError> {
    let Some(release) = source.latest_release(&descriptor.github).await? else {
        warn!(extension = %descriptor.name, "no release info, skipping");
        return Ok(None);
    };

    let Some(version) = release.tag_name else {
        warn!(extension = %descriptor.name, "release has no tag, skipping");
        return Ok(None);
    };

    if !is_safe_version_tag(&version) {
        return Err(SyncError::UnsafeVersionTag(version));
    }

    let Some(zipball_url) = release.zipball_url else {
        warn!(
            extension = %descriptor.name,
            version = %version,
            "release has no archive url, skipping"
        );
        return Ok(None);
    };

    let repo_dir = descriptor.repo_dir(output_dir);
    tokio::fs::create_dir_all(&repo_dir).await?;

    let archive_path = repo_dir.join(format!("{}.zip", version));
    let mut resolved = ResolvedRelease {
        version,
        zipball_url,
        repo_dir,
        archive_path,
        downloaded: false,
    };

    if is_valid_archive(&resolved.archive_path) {
        return Ok(Some(resolved));
    }

    info!(extension = %descriptor.name, version = %resolved.version, "downloading release");
    source
        .download_archive(&resolved.zipball_url, &resolved.archive_path)
        .await?;

    if !is_valid_archive(&resolved.archive_path) {
        return Err(SyncError::InvalidArchive(resolved.archive_path));
    }

    resolved.downloaded = true;
    Ok(Some(resolved))
}
