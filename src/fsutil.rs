//! Small filesystem helpers shared by the fetch pipeline.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Create `dir` and any missing parents. Succeeds if it already exists,
/// including when another task creates it concurrently.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Make sure the directory that will hold `file_path` exists.
pub async fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Resolve `path` against the current directory if it is relative.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Where releases land when the caller names no destination.
pub fn default_destination() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(env!("CARGO_PKG_NAME"))
}
