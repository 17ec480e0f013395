//! OpenAI Chat Completions API (`POST {base}/chat/completions`).
//!
//! Any server speaking the same format works too (Ollama, vLLM, Together AI
//! and friends). With an empty key no `Authorization` header is sent, which is
//! what local servers expect.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxFuture;

use super::provider::{LlmError, LlmProvider, ProviderSettings, post_json};
use super::types::{ChatRequest, ChatResponse, TokenUsage};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: String,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions.
pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base())
    }

    fn to_wire<'a>(&self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        let system = request.system.as_deref().map(|content| WireMessage {
            role: "system",
            content,
        });
        let rest = request.messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        });
        CompletionRequest {
            model: self.settings.resolve_model(&request.model, DEFAULT_MODEL),
            messages: system.into_iter().chain(rest).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

impl TryFrom<CompletionReply> for ChatResponse {
    type Error = LlmError;

    fn try_from(reply: CompletionReply) -> Result<Self, LlmError> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("reply has no choices".to_string()))?;
        Ok(ChatResponse {
            content: choice.message.content,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            usage: reply.usage.unwrap_or_default(),
            model: reply.model.unwrap_or_default(),
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, LlmError>> {
        let body = serde_json::to_value(self.to_wire(request));
        Box::pin(async move {
            let body = body.map_err(|e| LlmError::Parse(e.to_string()))?;
            let url = self.endpoint();
            debug!(%url, model = %body["model"], "Sending chat completion request");

            let mut http = self.client.post(url).timeout(self.settings.timeout);
            if !self.settings.api_key.is_empty() {
                http = http.bearer_auth(&self.settings.api_key);
            }
            let reply: CompletionReply = post_json(http, &body).await?;
            reply.try_into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::summary::{SummaryRequestSettings, build_summary_request};

    fn provider(base: &str) -> OpenAiProvider {
        OpenAiProvider::new(ProviderSettings::new(base, "sk-test"))
    }

    #[test]
    fn test_summary_request_wire_format() {
        let settings = SummaryRequestSettings {
            model: "gpt-4o".to_string(),
            max_tokens: 512,
        };
        let request = build_summary_request("### main.py\n```\nprint()\n```\n", &settings);
        let wire = serde_json::to_value(provider("https://api.openai.com/v1").to_wire(&request))
            .unwrap();

        assert_eq!(wire["model"], "gpt-4o");
        assert_eq!(wire["max_tokens"], 512);
        assert_eq!(wire["temperature"], serde_json::json!(0.2f32));
        let messages = wire["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1]["content"].as_str().unwrap().contains("### main.py"));
    }

    #[test]
    fn test_default_model_when_unset() {
        let request = ChatRequest::default();
        let wire = provider("http://localhost:11434/v1").to_wire(&request);
        assert_eq!(wire.model, DEFAULT_MODEL);
        assert!(wire.messages.is_empty());
    }

    #[test]
    fn test_endpoint_joins_base() {
        assert_eq!(
            provider("http://localhost:11434/v1/").endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_reply_takes_first_choice() {
        let reply: CompletionReply = serde_json::from_str(
            r#"{
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }"#,
        )
        .unwrap();
        let resp = ChatResponse::try_from(reply).unwrap();
        assert_eq!(resp.content.as_deref(), Some("{}"));
        assert_eq!(resp.finish_reason, "stop");
        assert_eq!(resp.usage.total_tokens, 15);
        assert_eq!(resp.model, "gpt-4o-mini");
    }

    #[test]
    fn test_reply_without_choices_is_parse_error() {
        let reply: CompletionReply = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            ChatResponse::try_from(reply),
            Err(LlmError::Parse(_))
        ));
    }

    #[test]
    fn test_null_content_is_none() {
        let reply: CompletionReply =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        let resp = ChatResponse::try_from(reply).unwrap();
        assert!(resp.content.is_none());
        assert_eq!(resp.finish_reason, "unknown");
    }
}
