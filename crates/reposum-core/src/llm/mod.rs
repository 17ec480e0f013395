//! LLM provider integration — chat completions and summary parsing.
//!
//! Providers sit behind the [`LlmProvider`] trait:
//!
//! - **OpenAI** — Chat Completions API, also compatible with Ollama, vLLM,
//!   Together AI and other OpenAI-compatible endpoints
//! - **Anthropic** — Claude models via the Messages API
//!
//! ```text
//! ┌────────────┐     ┌──────────────┐
//! │ Summarizer │────▶│ LlmProvider  │  (trait)
//! └────────────┘     └──────┬───────┘
//!                           │
//!                ┌──────────┴──────────┐
//!                ▼                     ▼
//!       ┌──────────────┐       ┌──────────────┐
//!       │    OpenAI    │       │  Anthropic   │
//!       │ (compatible) │       │ (Claude API) │
//!       └──────────────┘       └──────────────┘
//! ```

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod summary;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, ProviderSettings};
pub use summary::{
    SummaryError, SummaryParseError, SummaryRequestSettings, parse_summary, strip_code_fence,
    summarize_context,
};
pub use types::*;

/// Create an LLM provider from the `[llm]` config section.
pub fn create_provider(config: &reposum_config::LlmConfig) -> Box<dyn LlmProvider> {
    use reposum_config::LlmProviderKind;

    let settings = ProviderSettings::from_config(config);
    match config.provider.resolve(&config.api_base) {
        LlmProviderKind::Anthropic => Box::new(AnthropicProvider::new(settings)),
        LlmProviderKind::OpenAi | LlmProviderKind::Auto => Box::new(OpenAiProvider::new(settings)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposum_config::{LlmConfig, LlmProviderKind};

    #[test]
    fn test_create_anthropic_provider() {
        let config = LlmConfig {
            provider: LlmProviderKind::Anthropic,
            api_key: "test-key".to_string(),
            api_base: "https://api.anthropic.com".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config);
        assert_eq!(provider.name(), "Anthropic");
    }

    #[test]
    fn test_create_openai_provider() {
        let config = LlmConfig {
            provider: LlmProviderKind::OpenAi,
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config);
        assert_eq!(provider.name(), "OpenAI");
    }

    #[test]
    fn test_auto_detects_anthropic_base() {
        let config = LlmConfig {
            api_base: "https://api.anthropic.com".to_string(),
            ..Default::default()
        };
        assert_eq!(create_provider(&config).name(), "Anthropic");
        assert_eq!(create_provider(&LlmConfig::default()).name(), "OpenAI");
    }
}
