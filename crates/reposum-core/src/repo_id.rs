//! Repository identifier parsing.

use std::fmt;
use std::str::FromStr;

/// Rejected repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid repository {input:?}: expected owner/repo or https://github.com/owner/repo")]
pub struct RepoIdError {
    pub input: String,
}

/// A validated `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

const URL_PREFIXES: &[&str] = &["https://github.com/", "http://github.com/"];

fn valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

impl RepoId {
    pub fn new(owner: &str, name: &str) -> Result<Self, RepoIdError> {
        if valid_segment(owner) && valid_segment(name) {
            Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        } else {
            Err(RepoIdError {
                input: format!("{owner}/{name}"),
            })
        }
    }

    /// Parse `owner/repo` or a `github.com` URL, with an optional trailing slash.
    pub fn parse(input: &str) -> Result<Self, RepoIdError> {
        let invalid = || RepoIdError {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let rest = URL_PREFIXES
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .unwrap_or(trimmed);

        let (owner, name) = rest.split_once('/').ok_or_else(invalid)?;
        if name.contains('/') {
            return Err(invalid());
        }
        Self::new(owner, name).map_err(|_| invalid())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key under which results for this repository are cached.
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = RepoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
