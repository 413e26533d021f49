//! The release fetch pipeline: resolve, select, download, extract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::asset::{AssetSelector, DefaultAssetSelector};
use crate::client::{ClientConfig, GithubClient};
use crate::error::{Error, Result};
use crate::extract;
use crate::fsutil::{absolutize, default_destination, ensure_dir};
use crate::progress::ProgressFn;
use crate::release::{LatestRelease, ReleaseAsset, ReleaseByTag, ReleaseResolver, RepoInfo};

/// Options for one fetch operation.
///
/// ```rust,no_run
/// use relfetch::{fetch_latest_release, FetchOptions};
///
/// # async fn run() -> relfetch::Result<()> {
/// let files = fetch_latest_release(
///     FetchOptions::new("axllent", "mailpit").destination("./bin"),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    pub repo: RepoInfo,
    /// Where to write; defaults to [`default_destination`].
    pub destination: Option<PathBuf>,
    /// Unpack the downloaded archive and delete it afterwards (default `true`).
    pub should_extract: bool,
    /// Overrides [`DefaultAssetSelector`].
    pub asset_selector: Option<Arc<dyn AssetSelector>>,
    pub client: ClientConfig,
}

impl FetchOptions {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self::for_repo(RepoInfo::new(owner, repo))
    }

    pub fn for_repo(repo: RepoInfo) -> Self {
        Self {
            repo,
            destination: None,
            should_extract: true,
            asset_selector: None,
            client: ClientConfig::default(),
        }
    }

    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = Some(dir.into());
        self
    }

    pub fn should_extract(mut self, extract: bool) -> Self {
        self.should_extract = extract;
        self
    }

    pub fn access_token(mut self, token: &str) -> Self {
        self.client.access_token = Some(token.to_owned());
        self
    }

    pub fn progress(mut self, progress: ProgressFn) -> Self {
        self.client.progress = Some(progress);
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    pub fn asset_selector(mut self, selector: impl AssetSelector + 'static) -> Self {
        self.asset_selector = Some(Arc::new(selector));
        self
    }

    /// Select the asset with a closure receiving the release tag and its assets.
    pub fn select_asset_with<F>(self, select: F) -> Self
    where
        F: Fn(&str, &[ReleaseAsset]) -> Result<ReleaseAsset> + Send + Sync + 'static,
    {
        self.asset_selector(select)
    }
}

/// Download and extract the latest release of `options.repo`.
///
/// Returns the absolute paths written: the extracted entries, or the
/// downloaded file itself when extraction is off.
pub async fn fetch_latest_release(options: FetchOptions) -> Result<Vec<PathBuf>> {
    let client = GithubClient::with_config(options.client.clone())?;
    fetch_release(&client, &LatestRelease, &options).await
}

/// Download and extract the release of `options.repo` tagged `tag`.
pub async fn fetch_release_by_tag(options: FetchOptions, tag: &str) -> Result<Vec<PathBuf>> {
    options.repo.validate()?;
    if tag.is_empty() {
        return Err(Error::InvalidArgument("tag"));
    }
    let client = GithubClient::with_config(options.client.clone())?;
    fetch_release(&client, &ReleaseByTag(tag.to_owned()), &options).await
}

/// Run the fetch pipeline with an explicit client and release resolver.
///
/// Not transactional: a failure part-way leaves whatever earlier steps
/// wrote in the destination.
pub async fn fetch_release(
    client: &GithubClient,
    resolver: &dyn ReleaseResolver,
    options: &FetchOptions,
) -> Result<Vec<PathBuf>> {
    options.repo.validate()?;

    let release = resolver.resolve(client, &options.repo).await?;
    let version = release.version();
    info!(repo = %options.repo, version, assets = release.assets.len(), "resolved release");

    let asset = match &options.asset_selector {
        Some(selector) => selector.select(version, &release.assets)?,
        None => DefaultAssetSelector::new().select(version, &release.assets)?,
    };
    if asset.download_url.is_empty() {
        return Err(Error::AssetNotFound(format!(
            "asset {} has no download URL",
            asset.name
        )));
    }

    let destination = match &options.destination {
        Some(dir) => absolutize(dir)?,
        None => default_destination(),
    };
    ensure_dir(&destination).await?;

    let archive = client.download(&asset.download_url, &destination).await?;
    if !options.should_extract {
        return Ok(vec![archive]);
    }

    // Move the archive aside so an entry with the same name cannot overwrite
    // it while it is still being read.
    let staged = staging_path(&archive);
    tokio::fs::rename(&archive, &staged).await?;

    let entries = match extract::decompress(&staged, &destination).await {
        Ok(Some(entries)) => entries,
        Ok(None) => {
            tokio::fs::rename(&staged, &archive).await?;
            warn!(path = %archive.display(), "download is not a known archive, leaving it in place");
            return Ok(vec![archive]);
        }
        Err(e) => {
            tokio::fs::rename(&staged, &archive).await.ok();
            return Err(e);
        }
    };
    tokio::fs::remove_file(&staged).await?;

    let paths: Vec<PathBuf> = entries.into_iter().map(|e| destination.join(e)).collect();
    info!(destination = %destination.display(), files = paths.len(), "extracted release");
    Ok(paths)
}

fn staging_path(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    archive.with_file_name(format!(".{name}.{}.relfetch", std::process::id()))
}
