//! # relfetch
//!
//! Check GitHub releases for updates, and download and unpack the release
//! asset built for the running platform.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relfetch::{fetch_release_by_tag, is_update_available, newer_version, FetchOptions, RepoInfo};
//!
//! #[tokio::main]
//! async fn main() -> relfetch::Result<()> {
//!     assert!(newer_version("v0.1.0", "v0.0.1"));
//!
//!     let repo = RepoInfo::new("axllent", "mailpit");
//!     if is_update_available(&repo, "v1.0.0", None).await? {
//!         let files = fetch_release_by_tag(
//!             FetchOptions::for_repo(repo).destination("./bin"),
//!             "v1.21.0",
//!         )
//!         .await?;
//!         println!("installed {files:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod asset;
pub mod client;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fsutil;
pub mod platform;
pub mod progress;
pub mod release;
pub mod update;
pub mod version;

pub use api::Api;
pub use asset::{AssetSelector, DefaultAssetSelector};
pub use client::{ClientConfig, GithubClient};
pub use error::{Error, Result};
pub use fetch::{fetch_latest_release, fetch_release, fetch_release_by_tag, FetchOptions};
pub use platform::{Arch, Environment, Platform, PlatformIdentifier};
pub use progress::{default_progress_fn, ProgressFn};
pub use release::{LatestRelease, Release, ReleaseAsset, ReleaseByTag, ReleaseResolver, RepoInfo};
pub use update::{check_for_update, is_update_available, latest_release_info, list_releases};
pub use version::newer_version;
