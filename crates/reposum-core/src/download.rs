//! Priority-ordered downloads within a character budget.
//!
//! Candidates are fetched in fixed-size concurrent batches. Each file adds
//! `min(chars, per_file_max)` to the running total, anticipating the
//! truncation the context builder will apply. A new batch only starts while
//! the total is under budget; a batch in flight always completes, so the
//! result may overshoot by up to one batch.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::context::char_len;
use crate::github::RepoSource;
use crate::model::{ContextBudget, RepoFileCandidate, RepoFileContent};
use crate::repo_id::RepoId;

/// Number of fetches issued concurrently.
pub const BATCH_SIZE: usize = 10;

/// Outcome of a budgeted download run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadOutcome {
    /// Successfully fetched files, in candidate order.
    pub files: Vec<RepoFileContent>,
    /// Characters counted against the budget.
    pub used_chars: usize,
    /// Fetches that failed and were dropped.
    pub failed: usize,
    /// Candidates never attempted because the budget was met.
    pub skipped: usize,
}

/// Download `candidates` (sorted by ascending score) until `budget` is met.
///
/// Failed fetches are logged and dropped; they never abort sibling fetches.
pub async fn download_within_budget(
    source: &dyn RepoSource,
    repo: &RepoId,
    candidates: &[RepoFileCandidate],
    budget: ContextBudget,
) -> DownloadOutcome {
    let mut outcome = DownloadOutcome::default();
    let mut attempted = 0usize;

    for batch in candidates.chunks(BATCH_SIZE) {
        if outcome.used_chars >= budget.total_budget {
            break;
        }
        attempted += batch.len();

        let results = join_all(batch.iter().map(|c| source.fetch_file(repo, &c.path))).await;

        for (candidate, result) in batch.iter().zip(results) {
            match result {
                Ok(text) => {
                    outcome.used_chars += char_len(&text).min(budget.per_file_max);
                    outcome
                        .files
                        .push(RepoFileContent::fetched(candidate.clone(), text));
                }
                Err(e) => {
                    warn!(%repo, path = %candidate.path, error = %e, "Failed to download file");
                    outcome.failed += 1;
                }
            }
        }

        debug!(
            %repo,
            attempted,
            used_chars = outcome.used_chars,
            budget_chars = budget.total_budget,
            "Download batch complete"
        );
    }

    outcome.skipped = candidates.len() - attempted;
    outcome
}
