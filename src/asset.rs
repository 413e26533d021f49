//! Picking the release asset that matches a platform.

use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::{Environment, PlatformIdentifier};
use crate::release::ReleaseAsset;

/// Strategy for picking the one asset to download from a release.
///
/// Any `Fn(&str, &[ReleaseAsset]) -> Result<ReleaseAsset>` closure is a
/// selector; the first argument is the release's tag.
pub trait AssetSelector: Send + Sync {
    fn select(&self, version: &str, assets: &[ReleaseAsset]) -> Result<ReleaseAsset>;
}

impl<F> AssetSelector for F
where
    F: Fn(&str, &[ReleaseAsset]) -> Result<ReleaseAsset> + Send + Sync,
{
    fn select(&self, version: &str, assets: &[ReleaseAsset]) -> Result<ReleaseAsset> {
        self(version, assets)
    }
}

/// Picks the asset whose name contains the platform token, narrowing by
/// the arch token when several platform builds are published.
#[derive(Debug, Clone, Default)]
pub struct DefaultAssetSelector {
    env: Environment,
}

impl DefaultAssetSelector {
    /// Select for the running process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select as if running in `env`.
    pub fn for_environment(env: Environment) -> Self {
        Self { env }
    }
}

impl AssetSelector for DefaultAssetSelector {
    fn select(&self, version: &str, assets: &[ReleaseAsset]) -> Result<ReleaseAsset> {
        let id = PlatformIdentifier::detect(&self.env)?;
        let platform = id.platform.token();
        let arch = id.arch.token();

        let platform_assets: Vec<&ReleaseAsset> = assets
            .iter()
            .filter(|asset| asset.name.contains(platform))
            .collect();

        let chosen = match platform_assets.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                let mut arch_assets = many.iter().filter(|asset| asset.name.contains(arch));
                match (arch_assets.next(), arch_assets.next()) {
                    (Some(asset), None) => Some(*asset),
                    _ => None,
                }
            }
        };

        let asset = chosen.ok_or_else(|| {
            Error::AssetNotFound(format!(
                "no unique asset in release {version} for platform: {platform} and arch: {arch}"
            ))
        })?;
        debug!(asset = %asset.name, %id, "selected release asset");
        Ok(asset.clone())
    }
}
