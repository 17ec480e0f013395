#![deny(unsafe_code)]

//! Configuration loading and validation for reposum.
//!
//! Loads a TOML file into [`AppConfig`], layers environment overrides on top
//! (API keys and tokens usually live there), and validates the result before
//! anything downstream sees it.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP API listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// GitHub REST API access.
    #[serde(default)]
    pub github: GitHubConfig,

    /// LLM provider used for summarization.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Character budgets for downloading and assembling context.
    #[serde(default)]
    pub context: ContextConfig,

    /// Result cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the HTTP API listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    8000
}

/// GitHub REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the REST API (override for GitHub Enterprise).
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Optional personal access token. Raises the anonymous rate limit.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_github_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            token: None,
            timeout_secs: default_github_timeout_secs(),
        }
    }
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_github_timeout_secs() -> u64 {
    30
}

/// Which LLM wire protocol to speak.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Pick from `api_base`: Anthropic if it points at anthropic.com, OpenAI otherwise.
    #[default]
    Auto,
    /// OpenAI Chat Completions or any compatible endpoint (Ollama, vLLM, ...).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl LlmProviderKind {
    /// Resolve `Auto` against the configured API base.
    pub fn resolve(self, api_base: &str) -> LlmProviderKind {
        match self {
            LlmProviderKind::Auto if api_base.contains("anthropic.com") => {
                LlmProviderKind::Anthropic
            }
            LlmProviderKind::Auto => LlmProviderKind::OpenAi,
            other => other,
        }
    }
}

impl std::str::FromStr for LlmProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(LlmProviderKind::Auto),
            "openai" => Ok(LlmProviderKind::OpenAi),
            "anthropic" => Ok(LlmProviderKind::Anthropic),
            other => Err(ConfigError::Validation(format!(
                "llm.provider must be one of [\"auto\", \"openai\", \"anthropic\"], got {other:?}"
            ))),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// API base URL. OpenAI-compatible: `.../v1`; Anthropic: `https://api.anthropic.com`.
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    /// API key. May be empty for local OpenAI-compatible servers.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier; empty selects the provider's default.
    #[serde(default)]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            api_base: default_llm_api_base(),
            api_key: String::new(),
            model: String::new(),
            timeout_secs: default_llm_timeout_secs(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_llm_max_tokens() -> u32 {
    4096
}

/// Character budgets. Characters, not tokens: roughly four characters per token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Upper bound on the assembled context, prompt scaffolding included.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Reserved for the system and user prompt text around the file sections.
    #[serde(default = "default_prompt_buffer_chars")]
    pub prompt_buffer_chars: usize,

    /// Characters kept from any single file before truncation.
    #[serde(default = "default_per_file_max_chars")]
    pub per_file_max_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            prompt_buffer_chars: default_prompt_buffer_chars(),
            per_file_max_chars: default_per_file_max_chars(),
        }
    }
}

impl ContextConfig {
    /// Characters available for file sections.
    pub fn content_budget(&self) -> usize {
        self.max_context_chars
            .saturating_sub(self.prompt_buffer_chars)
    }
}

fn default_max_context_chars() -> usize {
    100_000
}

fn default_prompt_buffer_chars() -> usize {
    4_000
}

fn default_per_file_max_chars() -> usize {
    15_000
}

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached summaries (0 disables caching).
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
        }
    }
}

fn default_cache_max_size() -> usize {
    128
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    ///
    /// Environment overrides are not applied; see [`AppConfig::apply_env`].
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment, then re-validate.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, then re-validate.
    ///
    /// Empty values are ignored so that an exported-but-blank variable does
    /// not wipe a value from the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GITHUB_API_BASE") {
            self.github.api_base = v;
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(v.trim().to_string());
        }
        if let Some(v) = get("GITHUB_TIMEOUT") {
            self.github.timeout_secs = parse_number("GITHUB_TIMEOUT", &v)?;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = v.parse()?;
        }
        if let Some(v) = get("LLM_API_BASE") {
            self.llm.api_base = v;
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = v.trim().to_string();
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_TIMEOUT") {
            self.llm.timeout_secs = parse_number("LLM_TIMEOUT", &v)?;
        }
        if let Some(v) = get("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_number("LLM_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("MAX_CONTEXT_CHARS") {
            self.context.max_context_chars = parse_number("MAX_CONTEXT_CHARS", &v)?;
        }
        if let Some(v) = get("PROMPT_BUFFER_CHARS") {
            self.context.prompt_buffer_chars = parse_number("PROMPT_BUFFER_CHARS", &v)?;
        }
        if let Some(v) = get("PER_FILE_MAX_CHARS") {
            self.context.per_file_max_chars = parse_number("PER_FILE_MAX_CHARS", &v)?;
        }
        if let Some(v) = get("CACHE_MAX_SIZE") {
            self.cache.max_size = parse_number("CACHE_MAX_SIZE", &v)?;
        }
        if let Some(v) = get("REPOSUM_LOG_LEVEL") {
            self.logging.level = v;
        }

        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_port == 0 {
            return Err(ConfigError::Validation(
                "server.listen_port must be non-zero".to_string(),
            ));
        }
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }

        if self.github.api_base.is_empty() {
            return Err(ConfigError::Validation(
                "github.api_base must not be empty".to_string(),
            ));
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "github.timeout_secs must be non-zero".to_string(),
            ));
        }

        if self.llm.api_base.is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_base must not be empty".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "llm.max_tokens must be non-zero".to_string(),
            ));
        }

        let ctx = &self.context;
        if ctx.prompt_buffer_chars >= ctx.max_context_chars {
            return Err(ConfigError::Validation(format!(
                "context.prompt_buffer_chars ({}) must be smaller than context.max_context_chars ({})",
                ctx.prompt_buffer_chars, ctx.max_context_chars
            )));
        }
        if ctx.per_file_max_chars == 0 {
            return Err(ConfigError::Validation(
                "context.per_file_max_chars must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1");
        assert_eq!(config.server.listen_port, 8000);
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert!(config.llm.model.is_empty());
        assert_eq!(config.context.content_budget(), 96_000);
        assert_eq!(config.cache.max_size, 128);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.server.listen_port, 8000);
        assert_eq!(config.llm.provider, LlmProviderKind::Auto);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [server]
            listen_addr = "0.0.0.0"
            listen_port = 9000

            [github]
            token = "ghp_test"
            timeout_secs = 10

            [llm]
            provider = "anthropic"
            api_base = "https://api.anthropic.com"
            model = "claude-sonnet-4-20250514"
            max_tokens = 2048

            [context]
            max_context_chars = 50000
            prompt_buffer_chars = 2000
            per_file_max_chars = 8000

            [cache]
            max_size = 4

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(config.github.timeout_secs, 10);
        assert_eq!(config.llm.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.context.content_budget(), 48_000);
        assert_eq!(config.context.per_file_max_chars, 8000);
        assert_eq!(config.cache.max_size, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let toml = r#"
            [server]
            listen_port = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_buffer_larger_than_context() {
        let toml = r#"
            [context]
            max_context_chars = 1000
            prompt_buffer_chars = 1000
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("prompt_buffer_chars"));
    }

    #[test]
    fn test_validation_rejects_zero_per_file_max() {
        let toml = r#"
            [context]
            per_file_max_chars = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_provider() {
        let toml = r#"
            [llm]
            provider = "gemini"
        "#;
        assert!(matches!(
            AppConfig::parse(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_provider_auto_resolution() {
        assert_eq!(
            LlmProviderKind::Auto.resolve("https://api.anthropic.com"),
            LlmProviderKind::Anthropic
        );
        assert_eq!(
            LlmProviderKind::Auto.resolve("http://localhost:11434/v1"),
            LlmProviderKind::OpenAi
        );
        assert_eq!(
            LlmProviderKind::OpenAi.resolve("https://api.anthropic.com"),
            LlmProviderKind::OpenAi
        );
    }

    // ── Environment overrides ─────────────────────────────────────────

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[
                ("GITHUB_TOKEN", " ghp_abc "),
                ("LLM_PROVIDER", "Anthropic"),
                ("LLM_API_KEY", "sk-test"),
                ("MAX_CONTEXT_CHARS", "20000"),
                ("PER_FILE_MAX_CHARS", "500"),
                ("CACHE_MAX_SIZE", "2"),
            ]))
            .unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_abc"));
        assert_eq!(config.llm.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.context.content_budget(), 16_000);
        assert_eq!(config.context.per_file_max_chars, 500);
        assert_eq!(config.cache.max_size, 2);
    }

    #[test]
    fn test_env_ignores_blank_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[("LLM_MODEL", "  "), ("GITHUB_TOKEN", "")]))
            .unwrap();
        assert!(config.llm.model.is_empty());
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_env_rejects_bad_number() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env_of(&[("LLM_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT"));
    }

    #[test]
    fn test_env_result_is_validated() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env_of(&[("PROMPT_BUFFER_CHARS", "200000")]));
        assert!(result.is_err());
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reposum.toml");
        tokio::fs::write(&path, b"[server]\nlisten_port = 4242\n[cache]\nmax_size = 7\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.server.listen_port, 4242);
        assert_eq!(config.cache.max_size, 7);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("per_file_max_chars"));
        let parsed = AppConfig::parse(&rendered).unwrap();
        assert_eq!(parsed.context.per_file_max_chars, 15_000);
    }
}
