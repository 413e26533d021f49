//! Chainable builder over the fetch and update operations.
//!
//! `Api` carries client settings, `repo` narrows to one repository and `tag` or
//! `latest` picks the release to act on.

use std::path::PathBuf;
use std::sync::Arc;

use crate::asset::AssetSelector;
use crate::client::{ClientConfig, GithubClient};
use crate::error::{Error, Result};
use crate::fetch::{fetch_release, FetchOptions};
use crate::progress::{default_progress_fn, ProgressFn};
use crate::release::{LatestRelease, Release, ReleaseByTag, ReleaseResolver, RepoInfo};
use crate::update::check_for_update;

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry-point with a chainable builder API.
///
/// # Example
/// ```rust,no_run
/// use relfetch::Api;
///
/// #[tokio::main]
/// async fn main() -> relfetch::Result<()> {
///     let files = Api::new()
///         .set_destination("./out")
///         .repo("axllent/mailpit")?
///         .latest()
///         .fetch()
///         .await?;
///     println!("{files:?}");
///     Ok(())
/// }
/// ```
pub struct Api {
    config: ClientConfig,
    destination: Option<PathBuf>,
    should_extract: bool,
    asset_selector: Option<Arc<dyn AssetSelector>>,
}

impl Api {
    /// Create a new `Api` with sensible defaults.
    ///
    /// Token, API root and proxy are read from `GITHUB_TOKEN`,
    /// `GITHUB_API_URL` and `HTTP_PROXY` / `HTTPS_PROXY`.
    pub fn new() -> Self {
        Self {
            config: ClientConfig {
                progress: Some(default_progress_fn()),
                ..ClientConfig::from_env()
            },
            destination: None,
            should_extract: true,
            asset_selector: None,
        }
    }

    /// Set the destination directory (builder).
    pub fn set_destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = Some(dir.into());
        self
    }

    /// Keep downloaded archives packed (builder).
    pub fn set_extract(mut self, extract: bool) -> Self {
        self.should_extract = extract;
        self
    }

    /// Set the release API access token (builder).
    pub fn set_access_token(mut self, token: &str) -> Self {
        self.config.access_token = Some(token.to_owned());
        self
    }

    /// Point at another release API root, e.g. a GitHub Enterprise host (builder).
    pub fn set_api_base(mut self, url: &str) -> Self {
        self.config.api_base = url.to_owned();
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.config.proxy = Some(proxy.to_owned());
        self
    }

    /// Limit redirect hops per download (builder).
    pub fn set_max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Override the progress callback (builder).
    pub fn set_progress(mut self, progress: ProgressFn) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Disable progress output (builder).
    pub fn no_progress(mut self) -> Self {
        self.config.progress = None;
        self
    }

    /// Replace the platform-based asset choice (builder).
    pub fn set_asset_selector(mut self, selector: impl AssetSelector + 'static) -> Self {
        self.asset_selector = Some(Arc::new(selector));
        self
    }

    /// Select a repository in `owner/repo` form and return a [`RepoApi`].
    pub fn repo(self, repo: &str) -> Result<RepoApi> {
        Ok(RepoApi {
            repo: repo.parse()?,
            api: self,
        })
    }

    fn client(&self) -> Result<GithubClient> {
        GithubClient::with_config(self.config.clone())
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// RepoApi
// ──────────────────────────────────────────────────────────────────────────────

/// Intermediate builder after a repository has been specified.
pub struct RepoApi {
    api: Api,
    repo: RepoInfo,
}

impl RepoApi {
    /// Target the latest release.
    pub fn latest(self) -> ReleaseApi {
        ReleaseApi {
            api: self.api,
            repo: self.repo,
            tag: None,
        }
    }

    /// Target the release tagged `tag` (e.g. `"v1.21.0"`).
    pub fn tag(self, tag: &str) -> ReleaseApi {
        ReleaseApi {
            api: self.api,
            repo: self.repo,
            tag: Some(tag.to_owned()),
        }
    }

    /// Whether the latest release is newer than `current_version`.
    pub async fn is_update_available(&self, current_version: &str) -> Result<bool> {
        check_for_update(&self.api.client()?, &self.repo, current_version).await
    }

    /// Every release of the repository, newest first.
    pub async fn list_releases(&self) -> Result<Vec<Release>> {
        self.api.client()?.list_releases(&self.repo).await
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// ReleaseApi
// ──────────────────────────────────────────────────────────────────────────────

/// Intermediate builder after a release has been chosen.
pub struct ReleaseApi {
    api: Api,
    repo: RepoInfo,
    tag: Option<String>,
}

impl ReleaseApi {
    /// Resolve the release metadata without downloading anything.
    pub async fn release(&self) -> Result<Release> {
        let client = self.api.client()?;
        self.resolver()?.resolve(&client, &self.repo).await
    }

    /// Download the asset for this platform and unpack it.
    pub async fn fetch(self) -> Result<Vec<PathBuf>> {
        let client = self.api.client()?;
        let resolver = self.resolver()?;
        let options = FetchOptions {
            repo: self.repo,
            destination: self.api.destination,
            should_extract: self.api.should_extract,
            asset_selector: self.api.asset_selector,
            client: self.api.config,
        };
        fetch_release(&client, resolver.as_ref(), &options).await
    }

    fn resolver(&self) -> Result<Box<dyn ReleaseResolver>> {
        match &self.tag {
            None => Ok(Box::new(LatestRelease)),
            Some(tag) if tag.is_empty() => Err(Error::InvalidArgument("tag")),
            Some(tag) => Ok(Box::new(ReleaseByTag(tag.clone()))),
        }
    }
}
