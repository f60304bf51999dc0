//! Release archive validation and unpacking.
//!
//! GitHub zipballs wrap the repository in a single `<owner>-<repo>-<sha>/`
//! directory. Unpacking extracts into a scratch directory next to the
//! versions, then renames that wrapper to the version tag.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use super::error::SyncError;

/// Scratch directory inside a repo dir. Version tags never start with `.`.
pub const SCRATCH_DIR: &str = ".unpack";

/// Whether `path` is a readable zip archive.
///
/// A truncated download lacks the central directory and fails here.
pub fn is_valid_archive(path: &Path) -> bool {
    File::open(path)
        .ok()
        .and_then(|file| ZipArchive::new(file).ok())
        .is_some()
}

/// Whether a release tag can be used as a single directory name.
pub fn is_safe_version_tag(tag: &str) -> bool {
    !tag.is_empty()
        && !tag.starts_with('.')
        && !tag.contains(['/', '\\', '\0'])
}

/// Unpack `archive` so its contents end up at `version_dir`.
///
/// The scratch directory is removed afterwards whether or not unpacking
/// succeeded.
pub fn unpack_release(
    archive: &Path,
    repo_dir: &Path,
    repo_name: &str,
    version_dir: &Path,
) -> Result<(), SyncError> {
    let scratch = repo_dir.join(SCRATCH_DIR);
    remove_tree(&scratch)?;

    let result = extract_into(archive, &scratch, repo_name).and_then(|top| {
        debug!(from = %top.display(), to = %version_dir.display(), "moving unpacked tree");
        std::fs::rename(&top, version_dir)?;
        Ok(())
    });

    remove_tree(&scratch)?;
    result
}

fn extract_into(archive: &Path, scratch: &Path, repo_name: &str) -> Result<PathBuf, SyncError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    zip.extract(scratch)?;

    find_top_level_dir(scratch, repo_name)
}

/// The one extracted top-level directory whose name contains `repo_name`.
fn find_top_level_dir(scratch: &Path, repo_name: &str) -> Result<PathBuf, SyncError> {
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(scratch)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && entry.file_name().to_string_lossy().contains(repo_name) {
            matches.push(entry.path());
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        n => Err(SyncError::AmbiguousLayout {
            repo: repo_name.to_string(),
            matches: n,
        }),
    }
}

/// Remove a directory tree, treating a missing path as already removed.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
