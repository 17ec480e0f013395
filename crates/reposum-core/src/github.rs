//! GitHub REST client and the repository source abstraction.
//!
//! The pipeline only needs two things from a repository host: a recursive tree
//! listing and the raw text of individual files. [`RepoSource`] captures
//! exactly that; [`GitHubClient`] implements it against the REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::BoxFuture;
use crate::model::TreeEntry;
use crate::repo_id::RepoId;

const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";
const USER_AGENT: &str = concat!("reposum/", env!("CARGO_PKG_VERSION"));

/// Errors from fetching a repository tree. Fatal for the request.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("repository {0} not found or is private")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded; set GITHUB_TOKEN to raise the limit or retry later")]
    RateLimited,

    #[error("GitHub API error: {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("invalid GitHub API base URL {0:?}")]
    InvalidBaseUrl(String),
}

/// Why a single file could not be fetched. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum FileFetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("content is not valid UTF-8: {0}")]
    Decode(String),

    #[error("cannot build URL for {0:?}")]
    InvalidPath(String),
}

/// Something that can list and serve the files of a repository.
///
/// Implementations must be `Send + Sync`; the summarizer shares one instance
/// across concurrent requests.
pub trait RepoSource: Send + Sync {
    /// Recursive listing of every entry in the default branch.
    fn fetch_tree<'a>(&'a self, repo: &'a RepoId)
    -> BoxFuture<'a, Result<Vec<TreeEntry>, GitHubError>>;

    /// Raw text of a single file.
    fn fetch_file<'a>(
        &'a self,
        repo: &'a RepoId,
        path: &'a str,
    ) -> BoxFuture<'a, Result<String, FileFetchError>>;
}

/// Map a non-success tree listing status to an error.
pub fn classify_tree_status(status: u16, repo: &RepoId, body: &str) -> GitHubError {
    match status {
        404 => GitHubError::NotFound(repo.to_string()),
        403 | 429 => GitHubError::RateLimited,
        _ => GitHubError::Status {
            status,
            message: body.chars().take(500).collect(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// GitHub REST API client.
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    token: Option<String>,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client for the given API base (e.g. `https://api.github.com`).
    pub fn new(api_base: &str) -> Result<Self, GitHubError> {
        let api_base =
            Url::parse(api_base).map_err(|_| GitHubError::InvalidBaseUrl(api_base.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(GitHubError::InvalidBaseUrl(api_base.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_base,
            token: None,
            timeout: Duration::from_secs(30),
        })
    }

    /// Build a client from the `[github]` config section.
    pub fn from_config(config: &reposum_config::GitHubConfig) -> Result<Self, GitHubError> {
        Ok(Self::new(&config.api_base)?
            .with_token(config.token.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Authenticate requests with a token. Empty tokens are ignored.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn repo_url<'s>(&self, repo: &RepoId, tail: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api_base.clone();
        // `new` rejects cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner(), repo.name()])
                .extend(tail);
        }
        url
    }

    /// `GET /repos/{owner}/{repo}/git/trees/HEAD?recursive=1`
    pub fn tree_url(&self, repo: &RepoId) -> Url {
        let mut url = self.repo_url(repo, ["git", "trees", "HEAD"]);
        url.query_pairs_mut().append_pair("recursive", "1");
        url
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}`, percent-encoding each segment.
    pub fn contents_url(&self, repo: &RepoId, path: &str) -> Result<Url, FileFetchError> {
        if path.is_empty() || path.split('/').any(|s| s.is_empty() || s == "..") {
            return Err(FileFetchError::InvalidPath(path.to_string()));
        }
        Ok(self.repo_url(repo, std::iter::once("contents").chain(path.split('/'))))
    }

    fn get(&self, url: Url, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("accept", accept)
            .header("user-agent", USER_AGENT)
            .timeout(self.timeout);
        if let Some(ref token) = self.token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        req
    }
}

impl RepoSource for GitHubClient {
    fn fetch_tree<'a>(
        &'a self,
        repo: &'a RepoId,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>, GitHubError>> {
        Box::pin(async move {
            let url = self.tree_url(repo);
            debug!(%repo, %url, "Fetching repository tree");

            let resp = self
                .get(url, ACCEPT_JSON)
                .send()
                .await
                .map_err(|e| GitHubError::Network(e.to_string()))?;

            let status = resp.status();
            if status != StatusCode::OK {
                let body = resp.text().await.unwrap_or_default();
                return Err(classify_tree_status(status.as_u16(), repo, &body));
            }

            let listing: TreeResponse = resp
                .json()
                .await
                .map_err(|e| GitHubError::Parse(e.to_string()))?;

            if listing.truncated {
                warn!(%repo, entries = listing.tree.len(), "Tree listing truncated by GitHub");
            }
            Ok(listing.tree)
        })
    }

    fn fetch_file<'a>(
        &'a self,
        repo: &'a RepoId,
        path: &'a str,
    ) -> BoxFuture<'a, Result<String, FileFetchError>> {
        Box::pin(async move {
            let url = self.contents_url(repo, path)?;
            let resp = self
                .get(url, ACCEPT_RAW)
                .send()
                .await
                .map_err(|e| FileFetchError::Network(e.to_string()))?;

            if resp.status() != StatusCode::OK {
                return Err(FileFetchError::Status(resp.status().as_u16()));
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| FileFetchError::Network(e.to_string()))?;
            String::from_utf8(bytes.to_vec()).map_err(|e| FileFetchError::Decode(e.to_string()))
        })
    }
}
