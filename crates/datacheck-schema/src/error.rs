//! # Error Types
//!
//! Operational failures of a validation run, built with `thiserror`.
//!
//! Schema violations are not errors: a document that fails its schema is
//! reported as a [`Violation`](crate::Violation) and the run continues. Every
//! variant here aborts the run.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading schemas, discovering files, or parsing
/// documents.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The schema file is missing, unreadable, or not valid JSON.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoad {
        /// Path of the schema file that failed to load.
        path: PathBuf,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The schema parsed as JSON but is not a usable JSON Schema document.
    #[error("failed to compile schema '{name}': {reason}")]
    SchemaCompile {
        /// Schema name (e.g. `task` for `schemas/task.schema.json`).
        name: String,
        /// Human-readable reason reported by the validator.
        reason: String,
    },

    /// A file pattern could not be interpreted.
    #[error("invalid file pattern '{pattern}': {reason}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A data file could not be read.
    #[error("failed to read {path}: {source}")]
    DocumentRead {
        /// Path of the data file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A data file (or one line of a `.jsonl` file) is not valid JSON.
    #[error("malformed JSON in {}: {source}", location(path, *line))]
    DocumentParse {
        /// Path of the data file.
        path: PathBuf,
        /// 1-based line number for line-delimited files.
        line: Option<usize>,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The check plan file could not be loaded.
    #[error("failed to load check plan {path}: {reason}")]
    Plan {
        /// Path of the plan file.
        path: PathBuf,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Writing to the report sink failed.
    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),
}

fn location(path: &std::path::Path, line: Option<usize>) -> String {
    match line {
        Some(n) => format!("{}:{n}", path.display()),
        None => path.display().to_string(),
    }
}
