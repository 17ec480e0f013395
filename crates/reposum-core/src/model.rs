//! Shared data model for the summarization pipeline.
//!
//! Every length in this crate is a character count (Unicode scalar values),
//! never a byte count.

use serde::{Deserialize, Serialize};

/// Kind of object in a git tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// A submodule pointer.
    Commit,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes. Absent for trees and submodules.
    #[serde(default)]
    pub size: u64,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            size,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            size: 0,
        }
    }
}

/// A file that survived exclusion and received a priority score.
///
/// Lower scores are more important.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoFileCandidate {
    pub path: String,
    /// Size in bytes as reported by the tree listing.
    pub size: u64,
    pub score: f64,
}

/// A candidate together with its downloaded text.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoFileContent {
    pub candidate: RepoFileCandidate,
    /// `None` when the file was never fetched or could not be decoded.
    pub content: Option<String>,
}

impl RepoFileContent {
    /// A candidate that has not been fetched.
    pub fn pending(candidate: RepoFileCandidate) -> Self {
        Self {
            candidate,
            content: None,
        }
    }

    /// A candidate with fetched text.
    pub fn fetched(candidate: RepoFileCandidate, content: impl Into<String>) -> Self {
        Self {
            candidate,
            content: Some(content.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.candidate.path
    }
}

/// Character limits for downloading and assembling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Characters allowed across all included file sections.
    pub total_budget: usize,
    /// Characters kept from any single file before truncation.
    pub per_file_max: usize,
}

impl ContextBudget {
    pub fn new(total_budget: usize, per_file_max: usize) -> Self {
        Self {
            total_budget,
            per_file_max,
        }
    }

    /// Derive the budget from config: the context limit minus the prompt buffer.
    pub fn from_config(config: &reposum_config::ContextConfig) -> Self {
        Self::new(config.content_budget(), config.per_file_max_chars)
    }
}

/// The structured summary returned to callers and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub technologies: Vec<String>,
    pub structure: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_entry_deserializes_github_shape() {
        let json = r#"[
            {"path": "src", "mode": "040000", "type": "tree", "sha": "a1"},
            {"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "b2", "size": 120},
            {"path": "vendor/lib", "mode": "160000", "type": "commit", "sha": "c3"}
        ]"#;
        let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0], TreeEntry::tree("src"));
        assert_eq!(entries[1], TreeEntry::blob("src/main.rs", 120));
        assert_eq!(entries[2].kind, EntryKind::Commit);
        assert_eq!(entries[2].size, 0);
    }

    #[test]
    fn test_budget_from_config() {
        let config = reposum_config::ContextConfig {
            max_context_chars: 10_000,
            prompt_buffer_chars: 1_000,
            per_file_max_chars: 500,
        };
        let budget = ContextBudget::from_config(&config);
        assert_eq!(budget, ContextBudget::new(9_000, 500));
    }

    #[test]
    fn test_summary_result_requires_all_fields() {
        let missing = r#"{"summary": "x", "structure": "y"}"#;
        assert!(serde_json::from_str::<SummaryResult>(missing).is_err());
    }
}
