//! Global catalog assembly and JSON document I/O.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::error::SyncError;
use crate::types::{Catalog, PackageIndex, to_document_bytes};

/// File name of both the per-extension index and the global catalog.
pub const INDEX_FILE: &str = "index.json";

/// Write `<output>/index.json` listing `packages`.
///
/// An existing catalog listing exactly the same packages is left as is, so
/// a run without changes rewrites nothing. Returns whether the file was written.
pub fn write_catalog(
    output_dir: &Path,
    packages: Vec<PackageIndex>,
    built_at: DateTime<Utc>,
) -> Result<bool, SyncError> {
    let path = output_dir.join(INDEX_FILE);
    let catalog = Catalog::new(packages, built_at);

    if let Some(existing) = read_document::<Catalog>(&path)? {
        if existing.content_type == catalog.content_type && existing.packages == catalog.packages {
            info!(packages = catalog.packages.len(), "catalog unchanged");
            return Ok(false);
        }
    }

    write_document(&path, &catalog)?;
    info!(packages = catalog.packages.len(), path = %path.display(), "catalog written");
    Ok(true)
}

/// Every per-extension index currently published under `output_dir`.
pub fn load_published(output_dir: &Path) -> Result<Vec<PackageIndex>, SyncError> {
    let mut repo_dirs = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            repo_dirs.push(entry.path());
        }
    }
    repo_dirs.sort();

    let mut packages = Vec::new();
    for dir in repo_dirs {
        if let Some(index) = read_document::<PackageIndex>(&dir.join(INDEX_FILE))? {
            packages.push(index);
        }
    }

    Ok(packages)
}

/// Write a document as four-space indented JSON.
pub fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), SyncError> {
    std::fs::write(path, to_document_bytes(document)?)?;
    Ok(())
}

/// Read a document, or `None` if it is missing or unreadable as `T`.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SyncError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed document");
            Ok(None)
        }
    }
}
