//! Anthropic Messages API (`POST /v1/messages`).
//!
//! The system prompt travels in a top-level field rather than as a message,
//! and replies arrive as a list of typed content blocks of which only `text`
//! blocks are kept.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxFuture;

use super::provider::{LlmError, LlmProvider, ProviderSettings, post_json};
use super::types::{ChatRequest, ChatResponse, Role, TokenUsage};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Claude models via the Messages API.
pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Both `https://api.anthropic.com` and `https://api.anthropic.com/v1` are accepted.
    fn endpoint(&self) -> String {
        let base = self.settings.base();
        match base.strip_suffix("/v1") {
            Some(root) => format!("{root}/v1/messages"),
            None => format!("{base}/v1/messages"),
        }
    }

    fn to_wire<'a>(&self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        let system = request.system.as_deref().or_else(|| {
            request
                .messages
                .iter()
                .find(|m| m.role == Role::System)
                .map(|m| m.content.as_str())
        });
        MessagesRequest {
            model: self.settings.resolve_model(&request.model, DEFAULT_MODEL),
            max_tokens: request.max_tokens,
            system,
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

impl From<MessagesReply> for ChatResponse {
    fn from(reply: MessagesReply) -> Self {
        let text: String = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        let finish_reason = match reply.stop_reason.as_deref() {
            Some("end_turn") => "stop",
            Some("max_tokens") => "length",
            Some(other) => other,
            None => "unknown",
        };
        ChatResponse {
            content: (!text.is_empty()).then_some(text),
            finish_reason: finish_reason.to_string(),
            usage: TokenUsage {
                prompt_tokens: reply.usage.input_tokens,
                completion_tokens: reply.usage.output_tokens,
                total_tokens: reply.usage.input_tokens + reply.usage.output_tokens,
            },
            model: reply.model,
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic"
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, LlmError>> {
        let body = serde_json::to_value(self.to_wire(request));
        Box::pin(async move {
            let body = body.map_err(|e| LlmError::Parse(e.to_string()))?;
            let url = self.endpoint();
            debug!(%url, model = %body["model"], "Sending Anthropic request");

            let http = self
                .client
                .post(url)
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", API_VERSION)
                .timeout(self.settings.timeout);
            let reply: MessagesReply = post_json(http, &body).await?;
            Ok(reply.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::summary::{SummaryRequestSettings, build_summary_request};
    use crate::llm::types::ChatMessage;

    fn provider(base: &str) -> AnthropicProvider {
        AnthropicProvider::new(ProviderSettings::new(base, "key"))
    }

    #[test]
    fn test_summary_request_wire_format() {
        let settings = SummaryRequestSettings {
            model: String::new(),
            max_tokens: 2048,
        };
        let request = build_summary_request("### README.md\n```\nhi\n```\n", &settings);
        let wire = serde_json::to_value(provider(DEFAULT_API_BASE).to_wire(&request)).unwrap();

        assert_eq!(wire["model"], DEFAULT_MODEL);
        assert_eq!(wire["max_tokens"], 2048);
        assert!(wire["system"].as_str().unwrap().contains("JSON"));
        let messages = wire["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert!(messages[0]["content"].as_str().unwrap().contains("### README.md"));
    }

    #[test]
    fn test_system_message_is_lifted() {
        let request = ChatRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            ..Default::default()
        };
        let wire = provider(DEFAULT_API_BASE).to_wire(&request);
        assert_eq!(wire.system, Some("be brief"));
        assert_eq!(wire.messages.len(), 1);

        let request = ChatRequest {
            system: Some("explicit".to_string()),
            ..request
        };
        assert_eq!(provider(DEFAULT_API_BASE).to_wire(&request).system, Some("explicit"));
    }

    #[test]
    fn test_configured_model_is_used() {
        let mut settings = ProviderSettings::new(DEFAULT_API_BASE, "key");
        settings.model = "claude-opus-4-20250514".to_string();
        let provider = AnthropicProvider::new(settings);
        let request = ChatRequest::default();
        let wire = provider.to_wire(&request);
        assert_eq!(wire.model, "claude-opus-4-20250514");
    }

    #[test]
    fn test_endpoint_accepts_v1_suffix() {
        for base in [
            "https://api.anthropic.com",
            "https://api.anthropic.com/",
            "https://api.anthropic.com/v1",
        ] {
            assert_eq!(
                provider(base).endpoint(),
                "https://api.anthropic.com/v1/messages"
            );
        }
    }

    #[test]
    fn test_reply_concatenates_text_blocks() {
        let reply: MessagesReply = serde_json::from_str(
            r#"{
                "id": "msg_1",
                "type": "message",
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "{\"summary\": "},
                    {"type": "text", "text": "\"x\"}"}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 8}
            }"#,
        )
        .unwrap();
        let resp = ChatResponse::from(reply);
        assert_eq!(resp.content.as_deref(), Some("{\"summary\": \"x\"}"));
        assert_eq!(resp.finish_reason, "stop");
        assert_eq!(resp.usage.total_tokens, 18);
    }

    #[test]
    fn test_reply_without_text_has_no_content() {
        let reply: MessagesReply = serde_json::from_str(
            r#"{"model": "m", "content": [], "stop_reason": "max_tokens",
                "usage": {"input_tokens": 1, "output_tokens": 0}}"#,
        )
        .unwrap();
        let resp = ChatResponse::from(reply);
        assert!(resp.content.is_none());
        assert_eq!(resp.finish_reason, "length");
    }
}
