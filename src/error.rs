//! Error types for release lookup, download and extraction.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while resolving, downloading or unpacking a release.
#[derive(Debug, Error)]
pub enum Error {
    /// A required option (owner, repo, tag) was missing or empty.
    #[error("required \"{0}\" option is missing")]
    InvalidArgument(&'static str),

    /// The running OS/CPU pair has no known release naming.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No release asset satisfied the selection policy.
    #[error("unable to find release asset: {0}")]
    AssetNotFound(String),

    /// The release API reported no such release.
    #[error("release not found: {0}")]
    ReleaseNotFound(String),

    /// A configured or redirected URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network, TLS or body decoding failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { status: u16, url: String },

    /// A redirect response had no usable `location` header.
    #[error("redirect from {url} has no location header")]
    MissingRedirectTarget { url: String },

    /// The download followed more redirects than allowed.
    #[error("too many redirects (limit {max})")]
    TooManyRedirects { max: usize },

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read or unpacked.
    #[error("archive error: {0}")]
    Archive(String),
}

impl Error {
    /// Whether this failure happened while talking to a remote host.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::HttpStatus { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Io(std::io::Error::other(err))
    }
}
