//! In-crate stubs for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::BoxFuture;
use crate::github::{FileFetchError, GitHubError, RepoSource};
use crate::llm::{ChatRequest, ChatResponse, LlmError, LlmProvider};
use crate::model::TreeEntry;
use crate::repo_id::RepoId;

pub(crate) const REPLY: &str =
    r#"{"summary": "A widget.", "technologies": ["JavaScript"], "structure": "src/"}"#;

/// Serves a fixed set of files; a `None` tree means the repository is missing.
pub(crate) struct StubSource {
    pub tree: Option<Vec<TreeEntry>>,
    pub files: HashMap<String, String>,
    pub tree_calls: AtomicUsize,
}

impl StubSource {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            tree: Some(
                files
                    .iter()
                    .map(|(p, c)| TreeEntry::blob(*p, c.len() as u64))
                    .collect(),
            ),
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            tree_calls: AtomicUsize::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            tree: None,
            files: HashMap::new(),
            tree_calls: AtomicUsize::new(0),
        }
    }
}

impl RepoSource for StubSource {
    fn fetch_tree<'a>(
        &'a self,
        repo: &'a RepoId,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry>, GitHubError>> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .tree
            .clone()
            .ok_or_else(|| GitHubError::NotFound(repo.to_string()));
        Box::pin(async move { result })
    }

    fn fetch_file<'a>(
        &'a self,
        _repo: &'a RepoId,
        path: &'a str,
    ) -> BoxFuture<'a, Result<String, FileFetchError>> {
        let result = self
            .files
            .get(path)
            .cloned()
            .ok_or(FileFetchError::Status(404));
        Box::pin(async move { result })
    }
}

/// Replies with the same text to every request and records the prompts.
pub(crate) struct StubLlm {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, LlmError>> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.extend(request.messages.first().map(|m| m.content.clone()));
        }
        let reply = self.reply.clone();
        Box::pin(async move {
            Ok(ChatResponse {
                content: Some(reply),
                finish_reason: "stop".to_string(),
                usage: Default::default(),
                model: "stub".to_string(),
            })
        })
    }
}
