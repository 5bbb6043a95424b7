//! # Path Filter
//!
//! Excludes local paths that carry a well-known noise directory as one of
//! their path components (exact match, not substring — `node_modules0` is
//! kept).

const EXCLUDED_COMPONENTS: &[&str] = &[
    ".env",
    ".venv",
    "venv",
    "virtualenv",
    ".virtualenv",
    "__pycache__",
    ".mypy_cache",
    "node_modules",
    ".DS_Store",
];

/// `relpath` is expected to be forward-slash separated, as produced by
/// `LocalSource::list_files`.
pub fn is_excluded(relpath: &str) -> bool {
    relpath
        .split('/')
        .any(|component| EXCLUDED_COMPONENTS.contains(&component))
}
