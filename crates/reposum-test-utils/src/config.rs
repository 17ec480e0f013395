//! Configuration builders for tests.

use reposum_config::{AppConfig, LlmProviderKind};

/// Fluent builder for [`AppConfig`] in tests.
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .github_api_base("http://127.0.0.1:9000")
///     .cache_size(2)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn listen_addr(mut self, addr: &str) -> Self {
        self.config.server.listen_addr = addr.to_string();
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.server.listen_port = port;
        self
    }

    pub fn github_api_base(mut self, base: &str) -> Self {
        self.config.github.api_base = base.to_string();
        self
    }

    pub fn github_token(mut self, token: &str) -> Self {
        self.config.github.token = Some(token.to_string());
        self
    }

    pub fn llm(mut self, provider: LlmProviderKind, api_base: &str) -> Self {
        self.config.llm.provider = provider;
        self.config.llm.api_base = api_base.to_string();
        self
    }

    pub fn context_chars(mut self, max_context: usize, prompt_buffer: usize, per_file: usize) -> Self {
        self.config.context.max_context_chars = max_context;
        self.config.context.prompt_buffer_chars = prompt_buffer;
        self.config.context.per_file_max_chars = per_file;
        self
    }

    pub fn cache_size(mut self, n: usize) -> Self {
        self.config.cache.max_size = n;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
