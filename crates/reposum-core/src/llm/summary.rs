//! Prompting for and parsing the structured repository summary.
//!
//! The model is asked for a bare JSON object with `summary`, `technologies`
//! and `structure`. Models still wrap replies in markdown fences now and then,
//! so a single leading/trailing fence is stripped before decoding. Decoding is
//! strict: a missing or mistyped field is a parse error, not a default.

use tracing::{debug, error};

use crate::model::SummaryResult;

use super::provider::{LlmError, LlmProvider};
use super::types::{ChatMessage, ChatRequest};

pub const SYSTEM_PROMPT: &str = "\
You are a senior software engineer. Analyze the repository files you are given \
and describe the project as a JSON object.

Reply with JSON only: no markdown fences and no prose around it.

The object must have exactly these keys:
  \"summary\": 3-5 sentences on what the project does, who it is for, and how it is built.
  \"technologies\": an array of strings naming languages, frameworks, libraries and tools.
  \"structure\": a short description of the layout and the key modules.";

const USER_PROMPT_PREFIX: &str = "Repository files follow.\n\n";

const USER_PROMPT_SUFFIX: &str = "\n\nReturn the JSON object now, without code fences.";

const SUMMARY_TEMPERATURE: f32 = 0.2;

/// The model reply could not be decoded into a [`SummaryResult`].
#[derive(Debug, thiserror::Error)]
#[error("LLM returned invalid summary JSON: {source}")]
pub struct SummaryParseError {
    /// Reply text after fence stripping.
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// Failure of the summarization stage.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("LLM reply contained no text")]
    EmptyReply,

    #[error(transparent)]
    Parse(#[from] SummaryParseError),
}

/// Model and sampling settings for the summary request.
#[derive(Debug, Clone)]
pub struct SummaryRequestSettings {
    pub model: String,
    pub max_tokens: u32,
}

impl SummaryRequestSettings {
    pub fn from_config(config: &reposum_config::LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

/// Remove one surrounding markdown code fence, if present.
///
/// The opening fence line (including any language tag) is dropped; a closing
/// fence is dropped only when the reply ends with one.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_ticks) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match after_ticks.split_once('\n') {
        Some((_lang, rest)) => rest,
        None => after_ticks,
    };
    match body.trim_end().strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => body,
    }
}

/// Decode a model reply into a [`SummaryResult`].
pub fn parse_summary(raw: &str) -> Result<SummaryResult, SummaryParseError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|source| {
        let preview: String = body.chars().take(200).collect();
        error!(%preview, "LLM returned invalid JSON");
        SummaryParseError {
            raw: body.to_string(),
            source,
        }
    })
}

/// Build the chat request carrying `context`.
pub fn build_summary_request(context: &str, settings: &SummaryRequestSettings) -> ChatRequest {
    ChatRequest {
        model: settings.model.clone(),
        messages: vec![ChatMessage::user(format!(
            "{USER_PROMPT_PREFIX}{context}{USER_PROMPT_SUFFIX}"
        ))],
        max_tokens: settings.max_tokens,
        temperature: SUMMARY_TEMPERATURE,
        system: Some(SYSTEM_PROMPT.to_string()),
    }
}

/// Ask `provider` to summarize `context`.
pub async fn summarize_context(
    provider: &dyn LlmProvider,
    context: &str,
    settings: &SummaryRequestSettings,
) -> Result<SummaryResult, SummaryError> {
    let request = build_summary_request(context, settings);
    let response = provider.chat(&request).await?;
    debug!(
        provider = provider.name(),
        model = %response.model,
        finish_reason = %response.finish_reason,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        "LLM reply received"
    );

    let text = response
        .content
        .filter(|t| !t.trim().is_empty())
        .ok_or(SummaryError::EmptyReply)?;
    Ok(parse_summary(&text)?)
}
