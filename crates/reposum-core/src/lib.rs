#![deny(unsafe_code)]

//! reposum core pipeline.
//!
//! Turns a GitHub repository into an LLM-written summary:
//!
//! ```text
//! tree listing ─▶ filter & score ─▶ download within budget ─▶ assemble context ─▶ LLM ─▶ cache
//! ```
//!
//! The [`Summarizer`] drives the stages; everything it talks to over the
//! network sits behind the [`RepoSource`] and [`LlmProvider`] traits so the
//! pipeline can be exercised without a network.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future — the return type for async
/// trait methods that need dynamic dispatch (`dyn Trait`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Build-time version metadata.
pub mod build_info;
/// Insert-if-absent result cache.
pub mod cache;
/// Bounded context assembly from downloaded files.
pub mod context;
/// Priority-ordered, budget-limited file downloads.
pub mod download;
/// Error taxonomy surfaced at the pipeline boundary.
pub mod error;
/// Path exclusion and priority scoring.
pub mod filter;
/// GitHub REST client and the repository source abstraction.
pub mod github;
/// LLM providers and summary parsing.
pub mod llm;
/// Shared data model.
pub mod model;
/// Repository identifier parsing.
pub mod repo_id;
/// HTTP API.
pub mod server;
/// Pipeline orchestration.
pub mod summarizer;

#[cfg(test)]
mod test_support;

pub use cache::SummaryCache;
pub use error::SummarizeError;
pub use github::{GitHubClient, RepoSource};
pub use llm::LlmProvider;
pub use model::{ContextBudget, RepoFileCandidate, RepoFileContent, SummaryResult, TreeEntry};
pub use repo_id::RepoId;
pub use summarizer::Summarizer;
