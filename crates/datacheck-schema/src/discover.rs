//! # File Discovery
//!
//! Expands a glob-style pattern, relative to a root directory, into the data
//! files it matches.
//!
//! Supported per-segment syntax:
//!
//! - `*` matches any run of characters within one path segment.
//! - `?` matches exactly one character.
//! - `[abc]`, `[a-z]`, `[!a-z]` match one character from (or outside) a set.
//!   A `[` with no closing `]` is a literal character.
//!
//! Wildcards never match a leading `.` unless the pattern segment itself
//! starts with one. Results are sorted, so a given filesystem snapshot always
//! yields the same order. A pattern that matches nothing is not an error.

use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use crate::error::CheckError;

/// A compiled file pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wild(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Char(char),
    Any,
    Star,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

impl FilePattern {
    /// Compile a `/`-separated pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Pattern`] for an empty or absolute pattern.
    pub fn parse(pattern: &str) -> Result<Self, CheckError> {
        let invalid = |reason: &str| CheckError::Pattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.starts_with('/') {
            return Err(invalid("pattern must be relative to the root"));
        }

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(parse_segment)
            .collect();

        Ok(Self { segments })
    }

    /// Files under `root` matching this pattern, sorted.
    ///
    /// Directories that cannot be read are skipped with a warning.
    pub fn matches(&self, root: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![root.to_path_buf()];

        for (i, segment) in self.segments.iter().enumerate() {
            let last = i + 1 == self.segments.len();
            let mut next = Vec::new();
            for dir in &candidates {
                match segment {
                    Segment::Literal(name) => {
                        let path = dir.join(name);
                        if (last && path.is_file()) || (!last && path.is_dir()) {
                            next.push(path);
                        }
                    }
                    Segment::Wild(tokens) => expand(dir, tokens, last, &mut next),
                }
            }
            next.sort();
            candidates = next;
        }

        if self.segments.is_empty() {
            return Vec::new();
        }
        candidates
    }
}

fn expand(dir: &Path, tokens: &[Token], last: bool, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory during file discovery");
            return;
        }
    };

    let allow_hidden = matches!(tokens.first(), Some(Token::Char('.')));
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') && !allow_hidden {
            continue;
        }
        let kind_ok = if last { path.is_file() } else { path.is_dir() };
        if kind_ok && match_tokens(tokens, &name.chars().collect::<Vec<_>>()) {
            acc.push(path);
        }
    }
}

fn parse_segment(segment: &str) -> Segment {
    if !segment.contains(['*', '?', '[']) {
        return Segment::Literal(segment.to_string());
    }

    let mut tokens = Vec::new();
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        let token = match c {
            '*' => {
                // Consecutive stars are equivalent to one.
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                Token::Star
            }
            '?' => Token::Any,
            '[' => {
                let mut lookahead = chars.clone();
                match parse_class(&mut lookahead) {
                    Some(class) => {
                        chars = lookahead;
                        class
                    }
                    // An unterminated class is a literal `[`.
                    None => Token::Char('['),
                }
            }
            other => Token::Char(other),
        };
        tokens.push(token);
    }
    Segment::Wild(tokens)
}

/// Parse the body of a `[...]` class, positioned just after the `[`.
fn parse_class(chars: &mut Peekable<Chars<'_>>) -> Option<Token> {
    let negated = chars.next_if_eq(&'!').is_some();
    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let lo = chars.next()?;
        if lo == ']' && !first {
            break;
        }
        first = false;
        if chars.peek() == Some(&'-') {
            chars.next();
            match chars.next()? {
                ']' => {
                    ranges.push((lo, lo));
                    ranges.push(('-', '-'));
                    break;
                }
                hi => ranges.push((lo, hi)),
            }
        } else {
            ranges.push((lo, lo));
        }
    }
    Some(Token::Class { negated, ranges })
}

/// Match `name` against `tokens` in O(tokens × name) time.
///
/// Only the most recent `*` is ever backtracked to: a later star subsumes
/// every alternative an earlier one could try.
fn match_tokens(tokens: &[Token], name: &[char]) -> bool {
    let (mut t, mut n) = (0, 0);
    // Token index after the last star, and the name index it resumes from.
    let mut resume: Option<(usize, usize)> = None;

    while n < name.len() {
        match tokens.get(t) {
            Some(Token::Star) => {
                t += 1;
                resume = Some((t, n));
                continue;
            }
            Some(token) if match_one(token, name[n]) => {
                t += 1;
                n += 1;
                continue;
            }
            _ => {}
        }
        match resume {
            Some((star_t, star_n)) => {
                t = star_t;
                n = star_n + 1;
                resume = Some((star_t, n));
            }
            None => return false,
        }
    }
    tokens[t..].iter().all(|token| matches!(token, Token::Star))
}

fn match_one(token: &Token, c: char) -> bool {
    match token {
        Token::Char(expected) => *expected == c,
        Token::Any => true,
        Token::Class { negated, ranges } => {
            ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)) != *negated
        }
        Token::Star => false,
    }
}
