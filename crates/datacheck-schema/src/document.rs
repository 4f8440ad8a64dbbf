//! # Document Parsing
//!
//! Turns a data file into the JSON documents it contains.
//!
//! - `*.jsonl` files hold one document per line. Blank and whitespace-only
//!   lines are skipped; every other line must be a complete JSON value.
//!   Lines are read lazily, so documents before a malformed line are
//!   yielded (and can be validated) before the parse error surfaces.
//! - Any other file holds exactly one JSON document.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::iter::Enumerate;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CheckError;

/// Extension that marks a file as line-delimited.
pub const JSON_LINES_EXTENSION: &str = ".jsonl";

/// How a data file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// The whole file is one JSON value.
    Json,
    /// One JSON value per non-blank line.
    JsonLines,
}

impl DocumentFormat {
    /// Pick the format from the file name.
    pub fn for_path(path: &Path) -> Self {
        let is_lines = path
            .as_os_str()
            .as_encoded_bytes()
            .ends_with(JSON_LINES_EXTENSION.as_bytes());
        if is_lines {
            DocumentFormat::JsonLines
        } else {
            DocumentFormat::Json
        }
    }
}

/// One parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// 1-based line number, for documents read from a `.jsonl` file.
    pub line: Option<usize>,
    /// The parsed value.
    pub value: Value,
}

/// Iterator over the documents in one file.
///
/// Yields `Err` at most once; iteration should stop there.
#[derive(Debug)]
pub struct Documents {
    path: PathBuf,
    source: Source,
}

#[derive(Debug)]
enum Source {
    Whole(Option<Value>),
    Lines(Enumerate<Lines<BufReader<File>>>),
    Done,
}

/// Open `path` and prepare to iterate its documents.
///
/// # Errors
///
/// [`CheckError::DocumentRead`] if the file cannot be opened or read, and
/// [`CheckError::DocumentParse`] if a whole-file document is malformed.
pub fn read_documents(path: &Path) -> Result<Documents, CheckError> {
    let read_err = |source| CheckError::DocumentRead {
        path: path.to_path_buf(),
        source,
    };

    let source = match DocumentFormat::for_path(path) {
        DocumentFormat::Json => {
            let content = std::fs::read_to_string(path).map_err(read_err)?;
            let value = serde_json::from_str(&content).map_err(|source| {
                CheckError::DocumentParse {
                    path: path.to_path_buf(),
                    line: None,
                    source,
                }
            })?;
            Source::Whole(Some(value))
        }
        DocumentFormat::JsonLines => {
            let file = File::open(path).map_err(read_err)?;
            Source::Lines(BufReader::new(file).lines().enumerate())
        }
    };

    Ok(Documents {
        path: path.to_path_buf(),
        source,
    })
}

impl Documents {
    fn next_line(&mut self) -> Option<Result<Document, CheckError>> {
        let Source::Lines(lines) = &mut self.source else {
            return None;
        };

        for (index, line) in lines.by_ref() {
            let line_no = index + 1;
            let text = match line {
                Ok(text) => text,
                Err(source) => {
                    return Some(Err(CheckError::DocumentRead {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(&text)
                    .map(|value| Document {
                        line: Some(line_no),
                        value,
                    })
                    .map_err(|source| CheckError::DocumentParse {
                        path: self.path.clone(),
                        line: Some(line_no),
                        source,
                    }),
            );
        }
        None
    }
}

impl Iterator for Documents {
    type Item = Result<Document, CheckError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = if let Source::Whole(value) = &mut self.source {
            value.take().map(|value| Ok(Document { line: None, value }))
        } else {
            self.next_line()
        };
        if matches!(item, None | Some(Err(_))) {
            self.source = Source::Done;
        }
        item
    }
}
