//! Provider-neutral request and reply shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion request. Providers translate this to their wire format.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Empty defers to the provider's configured or built-in model.
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// System prompt; takes precedence over any `system` message.
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            system: None,
            max_tokens: 4096,
            temperature: 0.0,
        }
    }
}

/// A provider reply reduced to what the summarizer needs.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Reply text, `None` when the provider returned no text at all.
    pub content: Option<String>,
    /// Normalized to `stop` / `length` where the provider allows.
    pub finish_reason: String,
    pub usage: TokenUsage,
    /// Model reported by the provider.
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
