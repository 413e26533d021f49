//! Update checks and release listing.

use tracing::debug;

use crate::client::GithubClient;
use crate::error::Result;
use crate::release::{Release, RepoInfo};
use crate::version::newer_version;

/// Whether the latest release of `repo` is newer than `current_version`.
pub async fn is_update_available(
    repo: &RepoInfo,
    current_version: &str,
    access_token: Option<&str>,
) -> Result<bool> {
    let client = GithubClient::new(access_token)?;
    check_for_update(&client, repo, current_version).await
}

/// [`is_update_available`] against an already configured client.
pub async fn check_for_update(
    client: &GithubClient,
    repo: &RepoInfo,
    current_version: &str,
) -> Result<bool> {
    repo.validate()?;
    let latest = client.get_latest_release(repo).await?;
    let available = newer_version(latest.version(), current_version);
    debug!(%repo, latest = latest.version(), current = current_version, available, "checked for update");
    Ok(available)
}

/// Every release of `repo`, newest first.
pub async fn list_releases(repo: &RepoInfo, access_token: Option<&str>) -> Result<Vec<Release>> {
    repo.validate()?;
    GithubClient::new(access_token)?.list_releases(repo).await
}

/// The full record of the latest release of `repo`.
pub async fn latest_release_info(repo: &RepoInfo, access_token: Option<&str>) -> Result<Release> {
    repo.validate()?;
    GithubClient::new(access_token)?.get_latest_release(repo).await
}
