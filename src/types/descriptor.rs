//! Extension descriptors, one per YAML file in the extensions directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Static metadata describing one installable extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Unique identifier used as the catalog key.
    pub id: String,
    /// Display name, also the catalog sort key.
    pub name: String,
    pub content_type: String,
    /// GitHub coordinate in `owner/repo` form.
    pub github: String,
    /// Entry point relative to the unpacked release tree.
    pub main: String,

    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub marketing_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub flags: Option<Vec<String>>,
    /// Opaque to the updater; usually a mapping understood by clients.
    #[serde(default)]
    pub dock_icon: Option<serde_json::Value>,
    #[serde(default)]
    pub layerable: Option<serde_json::Value>,
}

impl ExtensionDescriptor {
    /// Last path segment of the GitHub coordinate (`org/alpha` -> `alpha`).
    pub fn repo_name(&self) -> &str {
        self.github.rsplit('/').next().unwrap_or(&self.github)
    }

    /// Whether `github` looks like `owner/repo`.
    pub fn has_valid_github(&self) -> bool {
        match self.github.split_once('/') {
            Some((owner, repo)) => {
                !owner.is_empty() && !repo.is_empty() && !repo.contains('/')
            }
            None => false,
        }
    }

    /// Directory holding every published version of this extension.
    pub fn repo_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.repo_name())
    }
}
