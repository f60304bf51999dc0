//! GitHub access: release lookup and archive download.

mod api;
mod client;
mod error;

pub use api::GithubClient;
pub use client::{LatestRelease, ReleaseSource};
pub use error::GithubError;

#[cfg(test)]
pub(crate) use api::tests::{Route, client as loopback_client, serve};
