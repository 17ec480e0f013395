#![deny(unsafe_code)]

//! reposum CLI — HTTP server and one-shot summaries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reposum_config::AppConfig;
use reposum_core::server::{self, AppState};
use reposum_core::{RepoId, SummaryCache, Summarizer};

/// reposum — summarize GitHub repositories with an LLM.
#[derive(Parser)]
#[command(name = "reposum", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "reposum.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API until Ctrl-C.
    Serve {
        /// Listen address, overriding `[server]` (e.g. `0.0.0.0:8080`).
        #[arg(long)]
        listen: Option<String>,
    },

    /// Summarize one repository and print the result as JSON.
    Summarize {
        /// `owner/repo` or a `https://github.com/owner/repo` URL.
        repo: String,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose, &config))),
        )
        .init();

    match cli.command {
        Commands::Serve { listen } => cmd_serve(config, listen).await?,
        Commands::Summarize { repo } => cmd_summarize(config, &repo).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

/// `-v` wins over `logging.level`; `RUST_LOG` wins over both.
fn log_filter(verbose: u8, config: &AppConfig) -> String {
    match verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn listen_addr(config: &AppConfig, listen: Option<String>) -> String {
    listen.unwrap_or_else(|| {
        format!(
            "{}:{}",
            config.server.listen_addr, config.server.listen_port
        )
    })
}

fn build_summarizer(config: &AppConfig) -> Result<Summarizer> {
    let cache = Arc::new(SummaryCache::from_config(&config.cache));
    Summarizer::from_config(config, cache).context("failed to configure summarizer")
}

async fn cmd_serve(config: AppConfig, listen: Option<String>) -> Result<()> {
    let addr = listen_addr(&config, listen);
    let state = Arc::new(AppState::new(build_summarizer(&config)?));
    info!(version = %reposum_core::build_info::version_string(), "Starting reposum");

    server::serve(&addr, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .with_context(|| format!("server on {addr} failed"))?;

    Ok(())
}

async fn cmd_summarize(config: AppConfig, repo: &str) -> Result<()> {
    let repo = RepoId::parse(repo)?;
    let summarizer = build_summarizer(&config)?;
    let result = summarizer
        .summarize(&repo)
        .await
        .with_context(|| format!("failed to summarize {repo}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

const REDACTED: &str = "***";

/// Copy of `config` with credentials masked, safe to print.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    if !config.llm.api_key.is_empty() {
        config.llm.api_key = REDACTED.to_string();
    }
    if let Some(token) = config.github.token.as_mut().filter(|t| !t.is_empty()) {
        *token = REDACTED.to_string();
    }
    config
}

fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&redacted(config)).context("TOML error")
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        println!("{}", render_config(config)?);
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if tokio::fs::try_exists(path).await.unwrap_or(false) {
        AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        AppConfig::default()
    };
    config
        .apply_process_env()
        .context("invalid environment override")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["reposum", "-vv", "serve", "--listen", "0.0.0.0:9000"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("reposum.toml"));
        assert!(matches!(cli.command, Commands::Serve { listen: Some(ref a) } if a == "0.0.0.0:9000"));
    }

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::try_parse_from(["reposum", "-c", "alt.toml", "summarize", "acme/widget"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(cli.command, Commands::Summarize { ref repo } if repo == "acme/widget"));
    }

    #[test]
    fn test_summarize_requires_repo() {
        assert!(Cli::try_parse_from(["reposum", "summarize"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        let config = AppConfig::default();
        assert_eq!(log_filter(0, &config), "info");
        assert_eq!(log_filter(1, &config), "debug");
        assert_eq!(log_filter(3, &config), "trace");
    }

    #[test]
    fn test_shown_config_masks_credentials() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| match key {
                "LLM_API_KEY" => Some("sk-live-123".to_string()),
                "GITHUB_TOKEN" => Some("ghp_live_456".to_string()),
                _ => None,
            })
            .unwrap();

        let shown = render_config(&config).unwrap();
        assert!(!shown.contains("sk-live-123"));
        assert!(!shown.contains("ghp_live_456"));

        let parsed = AppConfig::parse(&shown).unwrap();
        assert_eq!(parsed.llm.api_key, REDACTED);
        assert_eq!(parsed.github.token.as_deref(), Some(REDACTED));
        assert_eq!(config.llm.api_key, "sk-live-123");
    }

    #[test]
    fn test_shown_config_keeps_empty_credentials() {
        let parsed = AppConfig::parse(&render_config(&AppConfig::default()).unwrap()).unwrap();
        assert!(parsed.llm.api_key.is_empty());
        assert!(parsed.github.token.is_none());
    }

    #[test]
    fn test_listen_addr() {
        let config = AppConfig::default();
        assert_eq!(listen_addr(&config, None), "127.0.0.1:8000");
        assert_eq!(
            listen_addr(&config, Some("[::1]:1".to_string())),
            "[::1]:1"
        );
    }
}
