//! # datacheck-cli — Data Validation CLI
//!
//! Provides the `datacheck` command. With no arguments it validates the
//! repository's standard data files against their schemas:
//!
//! ```bash
//! datacheck
//! datacheck --root /path/to/repo
//! datacheck --plan checks.yaml -v
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing and exit-code mapping live here; validation logic
//!   lives in `datacheck-schema`.
//! - Violation lines go to stdout, logs go to stderr.

pub mod run;

use std::path::{Path, PathBuf};

/// Walk up from `start` to the first directory containing `schemas/`.
pub fn resolve_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join("schemas").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Resolve a path that may be relative to the current directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
