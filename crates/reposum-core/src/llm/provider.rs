//! LLM provider trait and the HTTP plumbing shared by its implementations.
//!
//! The summarizer dispatches through [`LlmProvider`], which also lets tests
//! swap in a canned provider.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::BoxFuture;

use super::types::{ChatRequest, ChatResponse};

/// Errors from LLM provider calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("authentication failed (check LLM_API_KEY): status {0}")]
    Auth(u16),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("provider error: {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout")]
    Timeout,
}

impl LlmError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(e.to_string())
        }
    }

    async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        match status {
            401 | 403 => LlmError::Auth(status),
            429 => LlmError::RateLimited {
                retry_after_secs: resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(60),
            },
            _ => {
                let body = resp.text().await.unwrap_or_default();
                LlmError::ProviderError {
                    status,
                    message: body.chars().take(500).collect(),
                }
            }
        }
    }
}

/// Endpoint, credentials and defaults for one provider instance.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_base: String,
    /// Trimmed; empty means unauthenticated.
    pub api_key: String,
    /// Used when a request leaves its model empty. Empty selects the provider default.
    pub model: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(api_base: impl Into<String>, api_key: &str) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.trim().to_string(),
            model: String::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(config: &reposum_config::LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ..Self::new(config.api_base.as_str(), &config.api_key)
        }
    }

    pub(crate) fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// First non-empty of the requested model, the configured model and `fallback`.
    pub(crate) fn resolve_model(&self, requested: &str, fallback: &str) -> String {
        [requested, self.model.as_str()]
            .into_iter()
            .find(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// POST a JSON body and decode a JSON reply, mapping failures to [`LlmError`].
pub(crate) async fn post_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R, LlmError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let resp = request
        .json(body)
        .send()
        .await
        .map_err(LlmError::from_reqwest)?;
    if !resp.status().is_success() {
        return Err(LlmError::from_response(resp).await);
    }
    resp.json()
        .await
        .map_err(|e| LlmError::Parse(e.to_string()))
}

/// Core trait for LLM providers.
///
/// Implementations must be `Send + Sync` to be shared across requests. Uses
/// `BoxFuture` for object safety (allows `Arc<dyn LlmProvider>`).
pub trait LlmProvider: Send + Sync {
    /// Provider display name (e.g. "Anthropic", "OpenAI").
    fn name(&self) -> &str;

    /// Perform a single non-streaming completion.
    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, LlmError>>;
}
