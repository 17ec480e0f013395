//! Context assembly — packs downloaded files into a bounded prompt blob.
//!
//! Files are taken in the order given (score order) and appended greedily as
//! fenced, titled sections. A single file is capped at `per_file_max`
//! characters. When the next section no longer fits, at most one partial
//! section is emitted to fill the remaining space and assembly stops; no
//! later file is tried even if it would have fit.

use tracing::debug;

use crate::model::{ContextBudget, RepoFileContent};

/// Appended wherever content was cut short.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Minimum content room (beyond the header) needed to emit a partial section.
const PARTIAL_MIN_CHARS: usize = 50;

/// Room reserved for the fence and marker of a partial section.
const PARTIAL_RESERVE_CHARS: usize = 20;

/// The first `max_chars` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn section_header(path: &str) -> String {
    format!("### {path}\n")
}

/// Build the context string from score-sorted files within `budget`.
///
/// Files without content are skipped. Sections are joined by a newline; the
/// separators are not counted against the budget.
pub fn build_context(files: &[RepoFileContent], budget: ContextBudget) -> String {
    let mut sections: Vec<String> = Vec::new();
    let mut used = 0usize;
    let mut partial = false;

    for file in files {
        let Some(raw) = file.content.as_deref() else {
            continue;
        };

        let content = if char_len(raw) > budget.per_file_max {
            format!(
                "{}{TRUNCATION_MARKER}",
                truncate_chars(raw, budget.per_file_max)
            )
        } else {
            raw.to_string()
        };

        let header = section_header(file.path());
        let section = format!("{header}```\n{content}\n```\n");
        let section_len = char_len(&section);

        if used + section_len > budget.total_budget {
            let remaining = budget.total_budget - used;
            let header_len = char_len(&header);
            if remaining > header_len + PARTIAL_MIN_CHARS {
                let available = remaining - header_len - PARTIAL_RESERVE_CHARS;
                sections.push(format!(
                    "{header}```\n{}{TRUNCATION_MARKER}\n```\n",
                    truncate_chars(&content, available)
                ));
                partial = true;
            }
            break;
        }

        sections.push(section);
        used += section_len;
    }

    debug!(
        sections = sections.len(),
        partial,
        used_chars = used,
        budget_chars = budget.total_budget,
        "Context assembled"
    );
    sections.join("\n")
}
