//! Sequential unpack and per-extension index publishing.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::archive::unpack_release;
use super::catalog::{INDEX_FILE, read_document, write_document};
use super::error::SyncError;
use super::fanout::FetchedExtension;
use super::fetch::ResolvedRelease;
use crate::types::{ExtensionDescriptor, PackageIndex};

/// Publishes fetched releases into the output tree.
pub struct Publisher<'a> {
    host: &'a str,
    built_at: DateTime<Utc>,
}

/// What the publish phase produced.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    /// Index documents for the global catalog, in input order.
    pub packages: Vec<PackageIndex>,
    /// Extensions unpacked during this run.
    pub unpacked: usize,
    /// Extensions left out because of a package-local error.
    pub failed: usize,
}

impl<'a> Publisher<'a> {
    pub fn new(host: &'a str, built_at: DateTime<Utc>) -> Self {
        Self { host, built_at }
    }

    /// Publish every extension with a resolved release, one at a time.
    ///
    /// Errors that only concern one extension are logged and skip it;
    /// filesystem errors abort.
    pub fn publish_all(&self, fetched: &[FetchedExtension]) -> Result<PublishOutcome, SyncError> {
        let mut outcome = PublishOutcome::default();

        for item in fetched {
            let Some(release) = &item.release else {
                continue;
            };

            match self.publish(&item.descriptor, release) {
                Ok((index, unpacked)) => {
                    outcome.packages.push(index);
                    if unpacked {
                        outcome.unpacked += 1;
                    }
                }
                Err(e) if e.is_package_local() => {
                    error!(
                        extension = %item.descriptor.name,
                        version = %release.version,
                        error = %e,
                        "publish failed"
                    );
                    outcome.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    /// Make sure `release` is unpacked and indexed.
    ///
    /// Returns the extension's index and whether it was unpacked by this call.
    pub fn publish(
        &self,
        descriptor: &ExtensionDescriptor,
        release: &ResolvedRelease,
    ) -> Result<(PackageIndex, bool), SyncError> {
        let version_dir = release.version_dir();
        let index_path = release.repo_dir.join(INDEX_FILE);

        let unpacked = if version_dir.is_dir() {
            debug!(extension = %descriptor.name, version = %release.version, "already unpacked");
            false
        } else {
            info!(extension = %descriptor.name, version = %release.version, "unpacking");
            unpack_release(
                &release.archive_path,
                &release.repo_dir,
                descriptor.repo_name(),
                &version_dir,
            )?;
            true
        };

        if !version_dir.join(&descriptor.main).is_file() {
            warn!(
                extension = %descriptor.name,
                main = %descriptor.main,
                "entry point missing from unpacked release"
            );
        }

        let index = PackageIndex::new(descriptor, &release.version, self.host, self.built_at);

        if !unpacked {
            if let Some(existing) = read_document::<PackageIndex>(&index_path)? {
                if same_apart_from_expiry(&existing, &index) {
                    return Ok((existing, false));
                }
            }
        }

        write_document(&index_path, &index)?;
        Ok((index, unpacked))
    }
}

/// Indexes differing only in `valid_until` describe the same publication.
fn same_apart_from_expiry(existing: &PackageIndex, fresh: &PackageIndex) -> bool {
    let mut existing = existing.clone();
    existing.valid_until.clone_from(&fresh.valid_until);
    existing == *fresh
}
