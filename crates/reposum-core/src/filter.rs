//! Path exclusion and priority scoring.
//!
//! Decides which files in a tree listing are worth downloading and in which
//! order. Scores are tiered so that READMEs, manifests and entry points always
//! outrank arbitrary source files; within a tier shallower paths win.
//! Lower score == higher priority.

use tracing::debug;

use crate::model::{EntryKind, RepoFileCandidate, TreeEntry};

/// Files larger than this are skipped as likely generated or binary.
pub const MAX_FILE_SIZE: u64 = 500_000;

const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    "__pycache__",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "vendor",
    "venv",
    ".venv",
    "env",
    ".env",
    "eggs",
    ".eggs",
    "bower_components",
    ".next",
    ".nuxt",
    "coverage",
    ".coverage",
    "htmlcov",
    "site-packages",
];

const EXCLUDED_FILENAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Pipfile.lock",
    "poetry.lock",
    "composer.lock",
    "Gemfile.lock",
    "Cargo.lock",
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
];

/// Matched against the lowercased filename with `ends_with`, so compound
/// suffixes like `.min.js` work.
const EXCLUDED_SUFFIXES: &[&str] = &[
    // images
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".webp",
    // audio / video
    ".mp3", ".mp4", ".wav", ".avi", ".mov", ".mkv",
    // archives
    ".zip", ".tar", ".gz", ".bz2", ".7z", ".rar",
    // native objects
    ".exe", ".dll", ".so", ".dylib", ".o", ".a",
    // fonts
    ".woff", ".woff2", ".ttf", ".eot", ".otf",
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx",
    // bytecode
    ".pyc", ".pyo", ".class", ".jar",
    // locks, minified bundles, source maps
    ".lock", ".min.js", ".min.css", ".map",
    ".ds_store",
];

const MANIFEST_NAMES: &[&str] = &[
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "package.json",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "Makefile",
    "CMakeLists.txt",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
];

const ENTRY_NAMES: &[&str] = &[
    "main.py",
    "app.py",
    "index.js",
    "index.ts",
    "server.py",
    "manage.py",
    "cli.py",
    "run.py",
    "__main__.py",
];

const TEST_INDICATORS: &[&str] = &["test_", "_test.", "spec.", ".test.", ".spec."];

const TEST_DIRS: &[&str] = &["test", "tests"];

/// Split a path into its directory segments and filename.
fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = path.split('/').collect();
    let filename = parts.pop().unwrap_or_default();
    (parts, filename)
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// `readme`, optionally followed by a single `.ext` of word characters.
fn is_readme(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    let Some(rest) = lower.strip_prefix("readme") else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    match rest.strip_prefix('.') {
        Some(ext) => !ext.is_empty() && ext.chars().all(|c| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    if TEST_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        return true;
    }
    let (dirs, _) = split_path(&lower);
    dirs.iter().any(|d| TEST_DIRS.contains(d))
}

/// Return `true` if the file should be skipped entirely.
pub fn is_excluded(path: &str, size: u64) -> bool {
    let (dirs, filename) = split_path(path);

    if dirs.iter().any(|d| EXCLUDED_DIRS.contains(d)) {
        return true;
    }
    if EXCLUDED_FILENAMES.contains(&filename) {
        return true;
    }

    let lower = filename.to_lowercase();
    if EXCLUDED_SUFFIXES.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }

    size > MAX_FILE_SIZE
}

/// Priority score for `path`. Lower is better.
pub fn score_file(path: &str) -> f64 {
    let (_, filename) = split_path(path);
    let depth = depth(path);
    let d = depth as f64;

    if depth == 0 && is_readme(filename) {
        return 0.0;
    }
    if MANIFEST_NAMES.contains(&filename) {
        return 10.0 + d;
    }
    if is_readme(filename) {
        return 20.0 + d;
    }
    if ENTRY_NAMES.contains(&filename) {
        return 30.0 + d;
    }
    if depth <= 1 {
        return 40.0;
    }
    if is_test_path(path) {
        return 80.0 + d;
    }
    60.0 + d
}

/// Turn a raw tree listing into candidates sorted by ascending score.
///
/// Non-blob entries and excluded files are dropped. Equal scores keep their
/// tree order.
pub fn rank_tree(entries: &[TreeEntry]) -> Vec<RepoFileCandidate> {
    let mut candidates: Vec<RepoFileCandidate> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Blob)
        .filter(|e| !is_excluded(&e.path, e.size))
        .map(|e| RepoFileCandidate {
            path: e.path.clone(),
            size: e.size,
            score: score_file(&e.path),
        })
        .collect();

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

    debug!(
        kept = candidates.len(),
        total = entries.len(),
        "Ranked tree entries"
    );
    candidates
}
