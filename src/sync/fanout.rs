//! Concurrent fetch of every extension.

use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::error;

use super::error::SyncError;
use super::fetch::{ResolvedRelease, fetch_archive};
use crate::github::ReleaseSource;
use crate::types::ExtensionDescriptor;

/// An extension after the fetch phase.
#[derive(Debug, Clone)]
pub struct FetchedExtension {
    pub descriptor: ExtensionDescriptor,
    /// `None` when skipped or failed; the extension is left out of this run.
    pub release: Option<ResolvedRelease>,
}

/// Fetch all extensions concurrently and wait for every one to finish.
///
/// A failing or timed-out fetch is logged and yields `release: None`
/// without affecting the others. Results keep the input order.
pub async fn fetch_all<S: ReleaseSource>(
    source: &S,
    descriptors: Vec<ExtensionDescriptor>,
    output_dir: &Path,
    concurrency: usize,
    timeout: Duration,
) -> Vec<FetchedExtension> {
    stream::iter(descriptors.into_iter().map(|descriptor| async move {
        let fetch = fetch_archive(source, &descriptor, output_dir);
        let outcome = tokio::time::timeout(timeout, fetch)
            .await
            .unwrap_or(Err(SyncError::Timeout(timeout)));

        let release = match outcome {
            Ok(release) => release,
            Err(e) => {
                error!(extension = %descriptor.name, error = %e, "fetch failed");
                None
            }
        };

        FetchedExtension {
            descriptor,
            release,
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}
