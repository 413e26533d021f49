//! HTTP access to the GitHub release API and to asset download hosts.
//!
//! API calls let reqwest follow redirects. Downloads walk redirects one hop at a
//! time so the hop count is bounded and the token never leaves the API host; the
//! file is named from the final response's `content-disposition`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use futures_util::StreamExt;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy, Response, StatusCode, Url};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fsutil::ensure_parent_dir;
use crate::progress::{ProgressFn, Reporter};
use crate::release::{Release, RepoInfo};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Redirect hops a single download may follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Used when the download response does not name the file. Not a claim that
/// the content is a zip archive; extraction sniffs the real format.
pub const DEFAULT_FILENAME: &str = "release.zip";

const RELEASES_PER_PAGE: usize = 100;

static EXTENDED_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)filename\*\s*=\s*([^;]+)").expect("valid regex"));
static PLAIN_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*("[^"]*"|[^;]*)"#).expect("valid regex"));

/// Settings for a [`GithubClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Release API root, e.g. `https://api.github.com`.
    pub api_base: String,
    /// Optional token sent as a bearer credential to the release API.
    pub access_token: Option<String>,
    /// Optional HTTP proxy URL.
    pub proxy: Option<String>,
    pub max_redirects: usize,
    /// Optional download progress callback.
    pub progress: Option<ProgressFn>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            access_token: None,
            proxy: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            progress: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `GITHUB_API_URL`, `GITHUB_TOKEN` and
    /// `HTTP_PROXY` / `HTTPS_PROXY` when set.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|s| !s.is_empty());
        let defaults = Self::default();
        Self {
            api_base: var("GITHUB_API_URL").unwrap_or(defaults.api_base),
            access_token: var("GITHUB_TOKEN"),
            proxy: var("HTTP_PROXY").or_else(|| var("HTTPS_PROXY")),
            ..defaults
        }
    }
}

/// Talks to the release API and downloads release assets.
///
/// API requests follow redirects automatically; asset downloads do not, so
/// every hop is visible to [`GithubClient::download`] and bounded by
/// `max_redirects`.
#[derive(Clone)]
pub struct GithubClient {
    api: Client,
    downloads: Client,
    api_base: Url,
    access_token: Option<String>,
    max_redirects: usize,
    progress: Option<ProgressFn>,
}

impl GithubClient {
    /// Client for the public GitHub API.
    pub fn new(access_token: Option<&str>) -> Result<Self> {
        Self::with_config(ClientConfig {
            access_token: access_token.map(str::to_owned),
            ..ClientConfig::default()
        })
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let api_base = parse_url(&config.api_base)?;
        if api_base.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: config.api_base,
                reason: "not a base URL".to_owned(),
            });
        }

        Ok(Self {
            api: build_http(&config, Policy::limited(config.max_redirects))?,
            downloads: build_http(&config, Policy::none())?,
            api_base,
            access_token: config.access_token,
            max_redirects: config.max_redirects,
            progress: config.progress,
        })
    }

    /// Fetch the latest published release.
    pub async fn get_latest_release(&self, repo: &RepoInfo) -> Result<Release> {
        let url = self.api_url(
            &["repos", repo.owner.as_str(), repo.repo.as_str(), "releases", "latest"],
            &[],
        )?;
        let resp = self.api_get(url).await?;
        let resp = check_api_status(resp, || format!("no published release for {repo}")).await?;
        Ok(resp.json().await?)
    }

    /// Fetch the release published under `tag`.
    pub async fn get_release_by_tag(&self, repo: &RepoInfo, tag: &str) -> Result<Release> {
        if tag.is_empty() {
            return Err(Error::InvalidArgument("tag"));
        }
        let url = self.api_url(
            &["repos", repo.owner.as_str(), repo.repo.as_str(), "releases", "tags", tag],
            &[],
        )?;
        let resp = self.api_get(url).await?;
        let resp = check_api_status(resp, || format!("no release tagged {tag} for {repo}")).await?;
        Ok(resp.json().await?)
    }

    /// List every release of the repository, newest first.
    pub async fn list_releases(&self, repo: &RepoInfo) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let per_page = RELEASES_PER_PAGE.to_string();

        for page in 1.. {
            let page = page.to_string();
            let url = self.api_url(
                &["repos", repo.owner.as_str(), repo.repo.as_str(), "releases"],
                &[("per_page", per_page.as_str()), ("page", page.as_str())],
            )?;
            let resp = self.api_get(url).await?;
            let resp = check_api_status(resp, || format!("repository {repo} not found")).await?;
            let batch: Vec<Release> = resp.json().await?;
            let done = batch.len() < RELEASES_PER_PAGE;
            releases.extend(batch);
            if done {
                break;
            }
        }

        debug!(%repo, count = releases.len(), "listed releases");
        Ok(releases)
    }

    /// Download `url` into `dest_dir`, following up to `max_redirects` hops.
    ///
    /// The file is named from the final response's `content-disposition`
    /// header, or [`DEFAULT_FILENAME`] when that is missing. Returns the
    /// path written.
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let mut current = parse_url(url)?;
        let mut hops = 0;

        let resp = loop {
            let resp = self.downloads.get(current.clone()).send().await?;
            let status = resp.status();

            if is_redirect(status) {
                if hops == self.max_redirects {
                    return Err(Error::TooManyRedirects {
                        max: self.max_redirects,
                    });
                }
                hops += 1;

                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| Error::MissingRedirectTarget {
                        url: current.to_string(),
                    })?;
                let next = current.join(location).map_err(|e| Error::InvalidUrl {
                    url: location.to_owned(),
                    reason: e.to_string(),
                })?;
                debug!(hop = hops, from = %current, to = %next, "following redirect");
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }
            break resp;
        };

        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition)
            .unwrap_or_else(|| {
                warn!(url = %current, fallback = DEFAULT_FILENAME, "no filename in content-disposition");
                DEFAULT_FILENAME.to_owned()
            });

        let dest_path = dest_dir.join(&filename);
        ensure_parent_dir(&dest_path).await?;
        let written = self.write_body(resp, url, &dest_path).await?;

        info!(path = %dest_path.display(), bytes = written, "downloaded release asset");
        Ok(dest_path)
    }

    /// Stream the response body into `dest_path`, reporting progress.
    async fn write_body(&self, resp: Response, src: &str, dest_path: &Path) -> Result<u64> {
        let total = resp.content_length().unwrap_or(0);
        let mut reporter = Reporter::new(self.progress.as_ref(), src, total);
        let mut file = tokio::fs::File::create(dest_path).await?;
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            reporter.advance(chunk.len());
        }
        file.flush().await?;
        reporter.finish();

        Ok(reporter.downloaded())
    }

    fn api_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl {
                url: self.api_base.to_string(),
                reason: "not a base URL".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn api_get(&self, url: Url) -> Result<Response> {
        debug!(%url, "release API request");
        let mut req = self
            .api
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }
}

fn build_http(config: &ClientConfig, redirect: Policy) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!("relfetch/", env!("CARGO_PKG_VERSION")))
        .redirect(redirect);
    if let Some(proxy_url) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }
    Ok(builder.build()?)
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

async fn check_api_status(resp: Response, not_found: impl FnOnce() -> String) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::ReleaseNotFound(not_found()));
    }
    if !status.is_success() {
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        debug!(%status, %url, body = %body, "release API error");
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url,
        });
    }
    Ok(resp)
}

/// Extract the suggested filename from a `content-disposition` value.
///
/// `filename*=` (RFC 5987) wins over `filename=`. Only the last path
/// component is kept, so a hostile header cannot write outside the
/// destination.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let raw = EXTENDED_FILENAME
        .captures(value)
        .and_then(|c| decode_extended(c[1].trim()))
        .or_else(|| {
            PLAIN_FILENAME
                .captures(value)
                .map(|c| c[1].trim().trim_matches('"').trim().to_owned())
        })?;

    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_owned())
}

/// Decode `charset'language'percent-encoded-name`.
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.trim_matches('"').splitn(3, '\'');
    let (_charset, _lang, encoded) = (parts.next()?, parts.next()?, parts.next()?);
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
