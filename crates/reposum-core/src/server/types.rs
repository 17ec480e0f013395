//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

/// `POST /summarize` body. Accepts a full GitHub URL or `owner/repo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub github_url: String,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub git_hash: String,
    pub uptime_secs: u64,
    pub cached: usize,
}
