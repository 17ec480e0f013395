//! Pipeline orchestration.
//!
//! One request runs these stages strictly in order, each feeding the next:
//!
//! ```text
//! CacheCheck ─▶ TreeFetch ─▶ Download ─▶ Assemble ─▶ Summarize ─▶ CacheStore
//! ```
//!
//! A cache hit short-circuits everything. Any stage failure aborts the request
//! and nothing is cached.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use reposum_config::AppConfig;

use crate::cache::SummaryCache;
use crate::context::{build_context, char_len};
use crate::download::download_within_budget;
use crate::error::SummarizeError;
use crate::filter::rank_tree;
use crate::github::{GitHubClient, RepoSource};
use crate::llm::{LlmProvider, SummaryRequestSettings, create_provider, summarize_context};
use crate::model::{ContextBudget, SummaryResult};
use crate::repo_id::RepoId;

/// A pipeline stage, used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CacheCheck,
    TreeFetch,
    Download,
    Assemble,
    Summarize,
    CacheStore,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CacheCheck => "cache_check",
            Stage::TreeFetch => "tree_fetch",
            Stage::Download => "download",
            Stage::Assemble => "assemble",
            Stage::Summarize => "summarize",
            Stage::CacheStore => "cache_store",
        };
        f.write_str(name)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Drives a repository through the summarization pipeline.
///
/// Cheap to share: every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct Summarizer {
    source: Arc<dyn RepoSource>,
    llm: Arc<dyn LlmProvider>,
    cache: Arc<SummaryCache>,
    budget: ContextBudget,
    settings: SummaryRequestSettings,
}

impl Summarizer {
    pub fn new(
        source: Arc<dyn RepoSource>,
        llm: Arc<dyn LlmProvider>,
        cache: Arc<SummaryCache>,
        budget: ContextBudget,
        settings: SummaryRequestSettings,
    ) -> Self {
        Self {
            source,
            llm,
            cache,
            budget,
            settings,
        }
    }

    /// Wire up the GitHub client and LLM provider described by `config`.
    pub fn from_config(
        config: &AppConfig,
        cache: Arc<SummaryCache>,
    ) -> Result<Self, SummarizeError> {
        let source = GitHubClient::from_config(&config.github)?;
        let llm: Arc<dyn LlmProvider> = Arc::from(create_provider(&config.llm));
        info!(
            github = %config.github.api_base,
            llm = llm.name(),
            model = %config.llm.model,
            cache_size = cache.capacity(),
            "Summarizer configured"
        );
        Ok(Self::new(
            Arc::new(source),
            llm,
            cache,
            ContextBudget::from_config(&config.context),
            SummaryRequestSettings::from_config(&config.llm),
        ))
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    pub fn budget(&self) -> ContextBudget {
        self.budget
    }

    /// Summarize `repo`, consulting and populating the cache.
    pub async fn summarize(&self, repo: &RepoId) -> Result<SummaryResult, SummarizeError> {
        let start = Instant::now();
        let result = self.run(repo, start).await;
        match &result {
            Ok(_) => info!(%repo, elapsed_ms = elapsed_ms(start), "Summary complete"),
            Err(e @ (SummarizeError::NotFound(_) | SummarizeError::RateLimited(_))) => {
                warn!(%repo, kind = e.kind(), error = %e, elapsed_ms = elapsed_ms(start), "Summary failed");
            }
            Err(e) => {
                error!(%repo, kind = e.kind(), error = %e, elapsed_ms = elapsed_ms(start), "Summary failed");
            }
        }
        result
    }

    async fn run(&self, repo: &RepoId, start: Instant) -> Result<SummaryResult, SummarizeError> {
        let key = repo.cache_key();

        if let Some(hit) = self.cache.get(&key) {
            info!(%repo, stage = %Stage::CacheCheck, elapsed_ms = elapsed_ms(start), "Cache hit");
            return Ok(hit);
        }
        debug!(%repo, stage = %Stage::CacheCheck, elapsed_ms = elapsed_ms(start), "Cache miss");

        let tree = self.source.fetch_tree(repo).await?;
        let candidates = rank_tree(&tree);
        info!(
            %repo,
            stage = %Stage::TreeFetch,
            entries = tree.len(),
            files = candidates.len(),
            elapsed_ms = elapsed_ms(start),
            "Tree fetched"
        );

        let outcome =
            download_within_budget(self.source.as_ref(), repo, &candidates, self.budget).await;
        info!(
            %repo,
            stage = %Stage::Download,
            files = outcome.files.len(),
            failed = outcome.failed,
            skipped = outcome.skipped,
            chars = outcome.used_chars,
            elapsed_ms = elapsed_ms(start),
            "Files downloaded"
        );

        let context = build_context(&outcome.files, self.budget);
        info!(
            %repo,
            stage = %Stage::Assemble,
            chars = char_len(&context),
            elapsed_ms = elapsed_ms(start),
            "Context assembled"
        );

        let summary = summarize_context(self.llm.as_ref(), &context, &self.settings).await?;
        info!(
            %repo,
            stage = %Stage::Summarize,
            technologies = summary.technologies.len(),
            elapsed_ms = elapsed_ms(start),
            "Summary generated"
        );

        let stored = self.cache.insert_if_absent(&key, summary.clone());
        debug!(
            %repo,
            stage = %Stage::CacheStore,
            stored,
            cached = self.cache.len(),
            elapsed_ms = elapsed_ms(start),
            "Cache updated"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{REPLY, StubLlm, StubSource};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn summarizer(source: Arc<StubSource>, llm: Arc<StubLlm>) -> Summarizer {
        Summarizer::new(
            source,
            llm,
            Arc::new(SummaryCache::new(4)),
            ContextBudget::new(10_000, 1_000),
            SummaryRequestSettings {
                model: "stub-model".to_string(),
                max_tokens: 256,
            },
        )
    }

    fn repo() -> RepoId {
        RepoId::new("acme", "widget").unwrap()
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::CacheCheck.to_string(), "cache_check");
        assert_eq!(Stage::CacheStore.to_string(), "cache_store");
    }

    #[tokio::test]
    async fn test_summarize_and_cache() {
        let source = Arc::new(StubSource::new(&[
            ("src/index.js", "console.log(1)"),
            ("README.md", "# Widget"),
        ]));
        let llm = Arc::new(StubLlm::new(REPLY));
        let s = summarizer(Arc::clone(&source), Arc::clone(&llm));

        let first = s.summarize(&repo()).await.unwrap();
        assert_eq!(first.summary, "A widget.");
        assert_eq!(s.cache().len(), 1);

        // README ranks first in the prompt.
        let prompt = llm.prompts.lock().unwrap()[0].clone();
        let readme = prompt.find("### README.md").unwrap();
        let index = prompt.find("### src/index.js").unwrap();
        assert!(readme < index);

        let second = s.summarize(&repo()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.tree_calls.load(Ordering::SeqCst), 1);
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_caches_nothing() {
        let source = Arc::new(StubSource::new(&[("README.md", "# Widget")]));
        let llm = Arc::new(StubLlm::new("definitely not json"));
        let s = summarizer(source, llm);

        let err = s.summarize(&repo()).await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert!(s.cache().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let s = summarizer(Arc::new(StubSource::missing()), Arc::new(StubLlm::new(REPLY)));
        let err = s.summarize(&repo()).await.unwrap_err();
        assert!(matches!(err, SummarizeError::NotFound(_)));
        assert!(s.cache().is_empty());
    }

    #[test]
    fn test_from_config_rejects_bad_base() {
        let mut config = AppConfig::default();
        config.github.api_base = "mailto:someone".to_string();
        let err = Summarizer::from_config(&config, Arc::new(SummaryCache::new(1)))
            .err()
            .unwrap();
        assert_eq!(err.status_code(), 500);
    }
}
