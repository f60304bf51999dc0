//! The fetch-and-publish pipeline.
//!
//! 1. Fetch: resolve and download every extension's latest release concurrently
//! 2. Publish: unpack new versions and write per-extension indexes, sequentially
//! 3. Catalog: write the global `index.json`
//!
//! Output layout:
//! ```text
//! <output>/index.json
//! <output>/<repo>/index.json
//! <output>/<repo>/<version>.zip
//! <output>/<repo>/<version>/
//! ```

mod archive;
mod catalog;
mod error;
mod fanout;
mod fetch;
mod publish;
#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{load_published, write_catalog};
pub use error::SyncError;

use fanout::fetch_all;
use fetch::ResolvedRelease;
use publish::Publisher;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::UpdaterConfig;
use crate::github::ReleaseSource;
use crate::types::ExtensionDescriptor;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub total: usize,
    /// Extensions with a usable release and archive.
    pub resolved: usize,
    /// Archives downloaded during this run.
    pub downloaded: usize,
    /// Versions unpacked during this run.
    pub unpacked: usize,
    /// Extensions listed in the catalog.
    pub published: usize,
    /// Extensions dropped by a publish error.
    pub failed: usize,
    /// False when the existing catalog was already up to date.
    pub catalog_written: bool,
}

/// Run the whole pipeline for `descriptors`.
pub async fn run<S: ReleaseSource>(
    source: &S,
    descriptors: Vec<ExtensionDescriptor>,
    config: &UpdaterConfig,
    built_at: DateTime<Utc>,
) -> Result<SyncReport, SyncError> {
    let output_dir = config.output_dir.as_path();
    tokio::fs::create_dir_all(output_dir).await?;

    let mut report = SyncReport {
        total: descriptors.len(),
        ..Default::default()
    };

    info!(extensions = report.total, "downloading extensions");
    let fetched = fetch_all(
        source,
        descriptors,
        output_dir,
        config.concurrency,
        config.fetch_timeout,
    )
    .await;

    let resolved: Vec<&ResolvedRelease> = fetched
        .iter()
        .filter_map(|f| f.release.as_ref())
        .collect();
    report.resolved = resolved.len();
    report.downloaded = resolved.iter().filter(|r| r.downloaded).count();
    info!(
        resolved = report.resolved,
        downloaded = report.downloaded,
        "download finished"
    );

    info!("unpacking extensions");
    let outcome = Publisher::new(&config.host, built_at).publish_all(&fetched)?;
    report.unpacked = outcome.unpacked;
    report.failed = outcome.failed;
    report.published = outcome.packages.len();
    info!(unpacked = report.unpacked, failed = report.failed, "unpacking finished");

    report.catalog_written = write_catalog(output_dir, outcome.packages, built_at)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{FakeSource, build_zip, release_zip};
    use crate::types::{Catalog, PackageIndex};
    use chrono::TimeZone;
    use secrecy::SecretString;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::tempdir;

    fn config(output_dir: &Path) -> UpdaterConfig {
        UpdaterConfig {
            github_username: "bot".to_string(),
            github_token: SecretString::from("token".to_string()),
            api_url: crate::config::DEFAULT_API_URL.to_string(),
            host: crate::config::DEFAULT_HOST.to_string(),
            extensions_dir: PathBuf::from("extensions"),
            output_dir: output_dir.to_path_buf(),
            concurrency: 4,
            fetch_timeout: Duration::from_secs(10),
        }
    }

    fn descriptor(id: &str, name: &str, repo: &str) -> ExtensionDescriptor {
        serde_yaml::from_str(&format!(
            "id: {id}\nname: {name}\ncontent_type: A\ngithub: org/{repo}\nmain: index.html\n"
        ))
        .unwrap()
    }

    fn built_at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap()
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .with_release(
                "org/alpha",
                "v2.0.0",
                release_zip("org-alpha-abc123", &[("index.html", "<html>alpha</html>")]),
            )
            .with_release(
                "org/beta",
                "1.4.0",
                release_zip("org-beta-def456", &[("index.html", "<html>beta</html>")]),
            )
    }

    /// Every file under `root` with its contents, keyed by relative path.
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_path_buf();
                    out.insert(rel, std::fs::read(&path).unwrap());
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(root, root, &mut out);
        out
    }

    fn catalog(root: &Path) -> Catalog {
        serde_json::from_slice(&std::fs::read(root.join("index.json")).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_publishes_latest_release() {
        let dir = tempdir().unwrap();
        let report = run(
            &source(),
            vec![descriptor("x1", "Alpha", "alpha")],
            &config(dir.path()),
            built_at(1),
        )
        .await
        .unwrap();

        assert_eq!(report.published, 1);
        assert!(dir.path().join("alpha/v2.0.0/index.html").is_file());
        assert!(dir.path().join("alpha/v2.0.0.zip").is_file());

        let index: PackageIndex =
            serde_json::from_slice(&std::fs::read(dir.path().join("alpha/index.json")).unwrap())
                .unwrap();
        assert_eq!(index.version, "v2.0.0");
        assert!(index.url.ends_with("/alpha/v2.0.0/index.html"));

        let catalog = catalog(dir.path());
        assert_eq!(catalog.packages, vec![index]);
        assert_eq!(catalog.content_type, "SN|Repo");
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempdir().unwrap();
        let descriptors = vec![
            descriptor("x1", "Alpha", "alpha"),
            descriptor("x2", "Beta", "beta"),
        ];

        let source = source();
        let first = run(&source, descriptors.clone(), &config(dir.path()), built_at(1))
            .await
            .unwrap();
        assert_eq!(first.downloaded, 2);
        assert_eq!(first.unpacked, 2);
        assert!(first.catalog_written);
        let before = snapshot(dir.path());

        let second = run(&source, descriptors, &config(dir.path()), built_at(2))
            .await
            .unwrap();

        assert_eq!(second.downloaded, 0);
        assert_eq!(second.unpacked, 0);
        assert_eq!(second.published, 2);
        assert!(!second.catalog_written);
        assert_eq!(source.download_count(), 2);
        assert_eq!(snapshot(dir.path()), before);
    }

    #[tokio::test]
    async fn test_partial_archive_redownloaded() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("alpha/v2.0.0.zip"), b"PK\x03\x04trunc").unwrap();

        let source = source();
        let report = run(
            &source,
            vec![descriptor("x1", "Alpha", "alpha")],
            &config(dir.path()),
            built_at(1),
        )
        .await
        .unwrap();

        assert_eq!(report.downloaded, 1);
        assert!(dir.path().join("alpha/v2.0.0/index.html").is_file());
    }

    #[tokio::test]
    async fn test_missing_release_excluded() {
        let dir = tempdir().unwrap();
        let report = run(
            &source(),
            vec![
                descriptor("x1", "Alpha", "alpha"),
                descriptor("x3", "Gone", "gone"),
                descriptor("x2", "Beta", "beta"),
            ],
            &config(dir.path()),
            built_at(1),
        )
        .await
        .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.resolved, 2);
        let names: Vec<String> = catalog(dir.path()).packages.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert!(!dir.path().join("gone").exists());
    }

    #[tokio::test]
    async fn test_catalog_order_independent_of_input() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let alpha = descriptor("x1", "Alpha", "alpha");
        let beta = descriptor("x2", "Beta", "beta");

        run(&source(), vec![alpha.clone(), beta.clone()], &config(first.path()), built_at(1))
            .await
            .unwrap();
        run(&source(), vec![beta, alpha], &config(second.path()), built_at(1))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(first.path().join("index.json")).unwrap(),
            std::fs::read(second.path().join("index.json")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_ambiguous_archive_does_not_abort_run() {
        let dir = tempdir().unwrap();
        let source = source().with_release(
            "org/gamma",
            "v3",
            build_zip(&[("org-gamma-a/", ""), ("org-gamma-b/", "")]),
        );

        let report = run(
            &source,
            vec![
                descriptor("x1", "Alpha", "alpha"),
                descriptor("x3", "Gamma", "gamma"),
            ],
            &config(dir.path()),
            built_at(1),
        )
        .await
        .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.published, 1);
        assert_eq!(catalog(dir.path()).packages[0].name, "Alpha");
    }
}
