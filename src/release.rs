//! Release data model and the strategies used to resolve a release.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::GithubClient;
use crate::error::{Error, Result};

/// Identity of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
}

impl RepoInfo {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        }
    }

    /// Fails with [`Error::InvalidArgument`] when owner or repo is empty.
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_empty() {
            return Err(Error::InvalidArgument("owner"));
        }
        if self.repo.is_empty() {
            return Err(Error::InvalidArgument("repo"));
        }
        Ok(())
    }
}

impl FromStr for RepoInfo {
    type Err = Error;

    /// Parse the `owner/repo` form.
    fn from_str(s: &str) -> Result<Self> {
        let (owner, repo) = s.split_once('/').unwrap_or((s, ""));
        let info = RepoInfo::new(owner.trim(), repo.trim());
        info.validate()?;
        Ok(info)
    }
}

impl fmt::Display for RepoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A published release as returned by the releases API.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    /// Tag name (e.g. `"v0.3.0"`).
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Release notes.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
    /// Attached assets, in the order the API lists them.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// The version this release was tagged with.
    pub fn version(&self) -> &str {
        &self.tag_name
    }
}

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub id: u64,
    /// File name (e.g. `"mailpit-linux-amd64.tar.gz"`).
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_count: u64,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: &str, download_url: &str) -> Self {
        Self {
            id: 0,
            name: name.to_owned(),
            label: None,
            content_type: None,
            size: 0,
            download_count: 0,
            download_url: download_url.to_owned(),
        }
    }
}

/// Strategy for turning a repository into release metadata.
///
/// The fetch pipeline calls this once per run; implement it to resolve
/// releases some other way (a fixed record in tests, a mirror, ...).
#[async_trait]
pub trait ReleaseResolver: Send + Sync {
    async fn resolve(&self, client: &GithubClient, repo: &RepoInfo) -> Result<Release>;
}

/// Resolves the repository's latest published release.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestRelease;

#[async_trait]
impl ReleaseResolver for LatestRelease {
    async fn resolve(&self, client: &GithubClient, repo: &RepoInfo) -> Result<Release> {
        client.get_latest_release(repo).await
    }
}

/// Resolves the release published under a specific tag.
#[derive(Debug, Clone)]
pub struct ReleaseByTag(pub String);

#[async_trait]
impl ReleaseResolver for ReleaseByTag {
    async fn resolve(&self, client: &GithubClient, repo: &RepoInfo) -> Result<Release> {
        client.get_release_by_tag(repo, &self.0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_repo() {
        let info: RepoInfo = "axllent/mailpit".parse().unwrap();
        assert_eq!(info, RepoInfo::new("axllent", "mailpit"));
        assert_eq!(info.to_string(), "axllent/mailpit");
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(matches!(
            "mailpit".parse::<RepoInfo>(),
            Err(Error::InvalidArgument("repo"))
        ));
        assert!(matches!(
            "/mailpit".parse::<RepoInfo>(),
            Err(Error::InvalidArgument("owner"))
        ));
    }

    #[test]
    fn deserializes_api_release() {
        let raw = r#"{
            "id": 42,
            "tag_name": "v1.2.3",
            "name": "1.2.3",
            "prerelease": false,
            "assets": [
                {"id": 7, "name": "tool-linux-amd64.tar.gz", "size": 1024,
                 "browser_download_url": "https://example.com/tool-linux-amd64.tar.gz"}
            ],
            "author": {"login": "someone"}
        }"#;
        let release: Release = serde_json::from_str(raw).unwrap();
        assert_eq!(release.version(), "v1.2.3");
        assert_eq!(release.assets.len(), 1);
        assert_eq!(
            release.assets[0].download_url,
            "https://example.com/tool-linux-amd64.tar.gz"
        );
        assert_eq!(release.assets[0].size, 1024);
    }
}
