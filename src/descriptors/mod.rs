//! Descriptor loading from the extensions directory.
//!
//! Every `*.yaml` file directly under the directory describes one extension.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::types::ExtensionDescriptor;

/// Load and validate every descriptor under `dir`, ordered by file name.
pub fn load_descriptors(dir: &Path) -> Result<Vec<ExtensionDescriptor>> {
    if !dir.is_dir() {
        bail!("Extensions directory not found: {}", dir.display());
    }

    let mut descriptors = Vec::new();
    for path in descriptor_files(dir)? {
        descriptors.push(parse_descriptor(&path)?);
    }

    validate(&descriptors)?;
    Ok(descriptors)
}

fn descriptor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.yaml", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .context("Invalid descriptor glob")?
        .collect::<Result<_, _>>()
        .context("Failed to list descriptor files")?;
    paths.retain(|p| p.is_file());
    paths.sort();

    Ok(paths)
}

/// Parse a single descriptor file.
pub fn parse_descriptor(path: &Path) -> Result<ExtensionDescriptor> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let descriptor: ExtensionDescriptor = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!(path = %path.display(), extension = %descriptor.id, "loaded descriptor");
    Ok(descriptor)
}

/// Reject descriptor sets that would collide in the catalog or the output tree.
fn validate(descriptors: &[ExtensionDescriptor]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut repos = HashSet::new();

    for desc in descriptors {
        for (key, value) in [
            ("id", &desc.id),
            ("name", &desc.name),
            ("content_type", &desc.content_type),
            ("main", &desc.main),
        ] {
            if value.is_empty() {
                bail!("Extension {:?} has an empty `{}`", desc.id, key);
            }
        }
        if !desc.has_valid_github() {
            bail!(
                "Extension {} has invalid github coordinate {:?} (expected owner/repo)",
                desc.id,
                desc.github
            );
        }
        if !ids.insert(desc.id.as_str()) {
            bail!("Duplicate extension id: {}", desc.id);
        }
        if !repos.insert(desc.repo_name()) {
            bail!(
                "Extension {} shares repository directory {:?} with another extension",
                desc.id,
                desc.repo_name()
            );
        }
    }

    Ok(())
}
