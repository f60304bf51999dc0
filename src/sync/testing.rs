//! Test fixtures: in-memory zipballs and a scripted release source.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::github::{GithubError, LatestRelease, ReleaseSource};

/// Build a zip from `(path, content)` pairs; paths ending in `/` are directories.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (path, content) in entries {
        if path.ends_with('/') {
            writer.add_directory(path.to_string(), options).unwrap();
        } else {
            writer.start_file(path.to_string(), options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// A GitHub-style zipball with everything under `top/`.
pub fn release_zip(top: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let dir = format!("{top}/");
    let paths: Vec<String> = files.iter().map(|(name, _)| format!("{top}/{name}")).collect();

    let mut entries = vec![(dir.as_str(), "")];
    entries.extend(paths.iter().map(String::as_str).zip(files.iter().map(|(_, c)| *c)));
    build_zip(&entries)
}

/// Release source answering from a fixed table.
#[derive(Default)]
pub struct FakeSource {
    releases: HashMap<String, LatestRelease>,
    archives: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    pub lookups: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `archive` as the latest release `tag` of `repo`.
    pub fn with_release(mut self, repo: &str, tag: &str, archive: Vec<u8>) -> Self {
        let url = format!("https://api.github.com/repos/{repo}/zipball/{tag}");
        self.releases.insert(
            repo.to_string(),
            LatestRelease {
                tag_name: Some(tag.to_string()),
                zipball_url: Some(url.clone()),
            },
        );
        self.archives.insert(url, archive);
        self
    }

    /// Answer lookups for `repo` with a raw release record.
    pub fn with_raw_release(mut self, repo: &str, release: LatestRelease) -> Self {
        self.releases.insert(repo.to_string(), release);
        self
    }

    /// Make every lookup for `repo` fail.
    pub fn with_error(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl ReleaseSource for FakeSource {
    async fn latest_release(&self, repo: &str) -> Result<Option<LatestRelease>, GithubError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(repo) {
            return Err(GithubError::Io(std::io::Error::other("connection reset")));
        }
        Ok(self.releases.get(repo).cloned())
    }

    async fn download_archive(&self, url: &str, dest: &Path) -> Result<u64, GithubError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self.archives.get(url).cloned().unwrap_or_default();
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
