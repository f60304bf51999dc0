//! Pipeline errors.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use zip::result::ZipError;

use crate::github::GithubError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("version tag {0:?} is not usable as a directory name")]
    UnsafeVersionTag(String),

    #[error("not a valid zip archive: {}", .0.display())]
    InvalidArchive(PathBuf),

    #[error("ambiguous archive layout for {repo}: {matches} top-level directories match")]
    AmbiguousLayout { repo: String, matches: usize },

    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub error: {0}")]
    Github(#[from] GithubError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl SyncError {
    /// Whether the error only concerns one extension.
    ///
    /// Filesystem and serialization failures abort the whole run. Extraction
    /// reports both kinds through `ZipError::Io`; only corrupt archive data
    /// stays local.
    pub fn is_package_local(&self) -> bool {
        match self {
            SyncError::Io(_) | SyncError::Json(_) => false,
            SyncError::Zip(ZipError::Io(e)) => is_corrupt_data(e),
            _ => true,
        }
    }
}

/// Errors raised while decoding entry data, such as a CRC mismatch.
fn is_corrupt_data(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
    )
}
