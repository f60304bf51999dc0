//! Published JSON documents: the per-extension index and the global catalog.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ExtensionDescriptor;

/// Content type of the global catalog document.
pub const REPO_CONTENT_TYPE: &str = "SN|Repo";

/// How long published documents claim to stay valid.
pub const VALIDITY_DAYS: i64 = 365 * 10;

/// Metadata for the latest published version of one extension.
///
/// Optional fields are only emitted when the descriptor provides a
/// non-empty value for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageIndex {
    pub identifier: String,
    pub name: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub valid_until: String,
    pub latest_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dock_icon: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layerable: Option<Value>,
}

impl PackageIndex {
    /// Build the index for `descriptor` published at `version`.
    ///
    /// `host` is the public base URL the static tree is served from.
    pub fn new(
        descriptor: &ExtensionDescriptor,
        version: &str,
        host: &str,
        built_at: DateTime<Utc>,
    ) -> Self {
        let host = host.trim_end_matches('/');
        let repo_name = descriptor.repo_name();

        Self {
            identifier: descriptor.id.clone(),
            name: descriptor.name.clone(),
            content_type: descriptor.content_type.clone(),
            area: non_empty(&descriptor.area),
            version: version.to_string(),
            description: non_empty(&descriptor.description),
            url: format!(
                "{}/extensions/{}/{}/{}",
                host, repo_name, version, descriptor.main
            ),
            download_url: format!(
                "https://github.com/{}/archive/{}.zip",
                descriptor.github, version
            ),
            marketing_url: non_empty(&descriptor.marketing_url),
            thumbnail_url: non_empty(&descriptor.thumbnail_url),
            valid_until: valid_until(built_at),
            latest_url: format!("{}/extensions/{}/index.json", host, repo_name),
            flags: descriptor.flags.clone().filter(|flags| !flags.is_empty()),
            dock_icon: truthy(&descriptor.dock_icon),
            layerable: truthy(&descriptor.layerable),
        }
    }
}

/// The global catalog listing every published extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub content_type: String,
    pub valid_until: String,
    pub packages: Vec<PackageIndex>,
}

impl Catalog {
    /// Build a catalog with `packages` sorted by display name.
    pub fn new(mut packages: Vec<PackageIndex>, built_at: DateTime<Utc>) -> Self {
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            content_type: REPO_CONTENT_TYPE.to_string(),
            valid_until: valid_until(built_at),
            packages,
        }
    }
}

/// Expiry timestamp: UTC, millisecond precision, `Z` suffix.
pub fn valid_until(built_at: DateTime<Utc>) -> String {
    (built_at + TimeDelta::days(VALIDITY_DAYS))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Serialize a document as JSON indented with four spaces.
pub fn to_document_bytes<T: Serialize>(document: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    document.serialize(&mut ser)?;
    Ok(out)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Opaque values are dropped when null, false, zero or empty.
fn truthy(value: &Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Array(a)) if a.is_empty() => None,
        Some(Value::Object(o)) if o.is_empty() => None,
        Some(v) => Some(v.clone()),
    }
}
