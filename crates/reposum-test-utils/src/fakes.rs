//! In-memory fakes for [`RepoSource`] and [`LlmProvider`].
//!
//! Both record what they were asked for so tests can assert on call counts,
//! request order and prompt content.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reposum_core::BoxFuture;
use reposum_core::github::{FileFetchError, GitHubError, classify_tree_status};
use reposum_core::llm::{ChatRequest, ChatResponse, LlmError, SummaryRequestSettings};
use reposum_core::{
    ContextBudget, LlmProvider, RepoId, RepoSource, SummaryCache, Summarizer, SummaryResult,
    TreeEntry,
};

/// A repository served from memory.
#[derive(Default)]
pub struct FakeRepoSource {
    tree: Vec<TreeEntry>,
    files: HashMap<String, String>,
    failing: HashSet<String>,
    tree_status: Option<u16>,
    tree_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeRepoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blob to the tree and serve `content` for it.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.tree.push(TreeEntry::blob(path, content.len() as u64));
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Add a tree entry without serving content for it.
    pub fn with_entry(mut self, entry: TreeEntry) -> Self {
        self.tree.push(entry);
        self
    }

    /// Make fetches of `path` fail with a 500.
    pub fn with_failing_file(mut self, path: &str, size: u64) -> Self {
        self.tree.push(TreeEntry::blob(path, size));
        self.failing.insert(path.to_string());
        self
    }

    /// Make the tree listing answer with a non-success `status`.
    pub fn with_tree_status(mut self, status: u16) -> Self {
        self.tree_status = Some(status);
        self
    }

    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }

    /// Paths requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl RepoSource for FakeRepoSource {
    fn fetch_tree<'a>(
        &'a self,
        repo: &'a RepoId,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>, GitHubError>> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.tree_status {
            Some(status) => Err(classify_tree_status(status, repo, "fake failure")),
            None => Ok(self.tree.clone()),
        };
        Box::pin(async move { result })
    }

    fn fetch_file<'a>(
        &'a self,
        _repo: &'a RepoId,
        path: &'a str,
    ) -> BoxFuture<'a, Result<String, FileFetchError>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(path.to_string());
        }
        let result = if self.failing.contains(path) {
            Err(FileFetchError::Status(500))
        } else {
            self.files
                .get(path)
                .cloned()
                .ok_or(FileFetchError::Status(404))
        };
        Box::pin(async move { result })
    }
}

/// An LLM that returns a canned reply or fails with a status.
pub struct FakeLlm {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl FakeLlm {
    /// Reply with `text` to every request.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Reply with `summary` serialized as JSON.
    pub fn replying_with(summary: &SummaryResult) -> Self {
        let text = serde_json::to_string(summary).expect("summary serializes");
        Self::replying(&text)
    }

    /// Fail every request with provider status `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    /// User prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request()
            .and_then(|r| r.messages.first().map(|m| m.content.clone()))
    }
}

impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, LlmError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        let result = match &self.reply {
            Ok(text) => Ok(ChatResponse {
                content: Some(text.clone()),
                finish_reason: "stop".to_string(),
                usage: Default::default(),
                model: "fake".to_string(),
            }),
            Err(status) => Err(LlmError::ProviderError {
                status: *status,
                message: "fake failure".to_string(),
            }),
        };
        Box::pin(async move { result })
    }
}

/// A summarizer over the given fakes.
pub fn fake_summarizer(
    source: Arc<FakeRepoSource>,
    llm: Arc<FakeLlm>,
    cache: Arc<SummaryCache>,
    budget: ContextBudget,
) -> Summarizer {
    Summarizer::new(
        source,
        llm,
        cache,
        budget,
        SummaryRequestSettings {
            model: "fake-model".to_string(),
            max_tokens: 512,
        },
    )
}
