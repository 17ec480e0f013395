//! Error taxonomy surfaced at the pipeline boundary.
//!
//! Every failure a request can end with is one of four kinds. Per-file fetch
//! failures never reach this level; the download stage absorbs them.

use crate::github::GitHubError;
use crate::llm::SummaryError;

const UPSTREAM_MESSAGE: &str = "upstream service error";
const INTERNAL_MESSAGE: &str = "internal server error";

/// Why a summarize request failed.
///
/// The payload is the full diagnostic and is meant for logs; callers should
/// be shown [`SummarizeError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SummarizeError {
    /// HTTP status associated with this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::RateLimited(_) => 429,
            Self::Upstream(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::RateLimited(msg) => msg.clone(),
            Self::Upstream(_) => UPSTREAM_MESSAGE.to_string(),
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Short name of the kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::RateLimited(_) => "rate_limited",
            Self::Upstream(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<GitHubError> for SummarizeError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(_) => Self::NotFound(err.to_string()),
            GitHubError::RateLimited => Self::RateLimited(err.to_string()),
            GitHubError::InvalidBaseUrl(_) => Self::Internal(err.to_string()),
            GitHubError::Status { .. } | GitHubError::Network(_) | GitHubError::Parse(_) => {
                Self::Upstream(err.to_string())
            }
        }
    }
}

impl From<SummaryError> for SummarizeError {
    fn from(err: SummaryError) -> Self {
        Self::Upstream(format!("summarization failed: {err}"))
    }
}
