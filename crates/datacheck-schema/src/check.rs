//! # Checks and Runs
//!
//! A [`Check`] pairs a file pattern with a schema name. Running it loads the
//! schema, discovers the matching files, parses every document, validates
//! each one, and writes one report line per violation:
//!
//! ```text
//! [data/routing.json] "default" is a required property
//! [data/tasks.jsonl:7] 3 is not of type "string"
//! ```
//!
//! A [`CheckPlan`] is the ordered list of checks a run executes. Every check
//! in a plan runs, even after an earlier one has failed; the run passes only
//! if all of them pass.
//!
//! ## Failure model
//!
//! Schema violations are collected and reported. Anything else (a missing
//! schema, an unreadable file, malformed JSON) is a [`CheckError`] and ends
//! the run immediately.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discover::FilePattern;
use crate::document::read_documents;
use crate::error::CheckError;
use crate::registry::SchemaRegistry;
use crate::violation::Validate;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One `(pattern, schema)` validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Glob-style pattern relative to the root, e.g. `data/tasks.jsonl`.
    pub pattern: String,
    /// Schema name, e.g. `task` for `schemas/task.schema.json`.
    pub schema: String,
}

impl Check {
    /// Build a check from a pattern and a schema name.
    pub fn new(pattern: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            schema: schema.into(),
        }
    }
}

/// The checks a run executes, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPlan {
    /// Checks in execution order.
    pub checks: Vec<Check>,
}

impl Default for CheckPlan {
    /// The repository's standard data files and their schemas.
    fn default() -> Self {
        Self {
            checks: vec![
                Check::new("data/objectives.jsonl", "objective"),
                Check::new("data/projects.jsonl", "project"),
                Check::new("data/tasks.jsonl", "task"),
                Check::new("data/runs.jsonl", "run"),
                Check::new("data/policies.jsonl", "policy"),
                Check::new("data/routing.json", "routing"),
            ],
        }
    }
}

impl CheckPlan {
    /// Load a plan from a YAML (or JSON) file of the form
    /// `checks: [{pattern: ..., schema: ...}, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Plan`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CheckError> {
        let content = std::fs::read_to_string(path).map_err(|e| CheckError::Plan {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| CheckError::Plan {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// The check that ran.
    pub check: Check,
    /// Number of files the pattern matched.
    pub files: usize,
    /// Number of documents validated.
    pub documents: usize,
    /// Number of violations reported.
    pub violations: usize,
}

impl CheckOutcome {
    fn new(check: &Check) -> Self {
        Self {
            check: check.clone(),
            files: 0,
            documents: 0,
            violations: 0,
        }
    }

    /// True if every document conformed. A check that matched no files
    /// passes.
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

/// Result of a whole plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Per-check outcomes in execution order.
    pub checks: Vec<CheckOutcome>,
}

impl RunOutcome {
    /// True if every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckOutcome::passed)
    }

    /// Total violations across all checks.
    pub fn violations(&self) -> usize {
        self.checks.iter().map(|c| c.violations).sum()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run every check in `plan` against files under `root`, writing violation
/// lines to `out`.
///
/// All checks execute regardless of earlier failures.
///
/// # Errors
///
/// Returns the first [`CheckError`] encountered; checks after it do not run.
pub fn run_plan<W: Write>(
    registry: &mut SchemaRegistry,
    root: &Path,
    plan: &CheckPlan,
    out: &mut W,
) -> Result<RunOutcome, CheckError> {
    let mut outcome = RunOutcome::default();
    for check in &plan.checks {
        outcome.checks.push(run_check(registry, root, check, out)?);
    }
    Ok(outcome)
}

/// Run a single check.
///
/// # Errors
///
/// Schema load or compile failures, bad patterns, and unreadable or
/// malformed data files are returned as [`CheckError`]. Schema violations
/// are not errors; they are written to `out` and counted.
pub fn run_check<W: Write>(
    registry: &mut SchemaRegistry,
    root: &Path,
    check: &Check,
    out: &mut W,
) -> Result<CheckOutcome, CheckError> {
    let schema = registry.load(&check.schema)?;
    let pattern = FilePattern::parse(&check.pattern)?;
    let files = pattern.matches(root);

    let outcome = check_files(schema, check, root, &files, out)?;

    tracing::info!(
        pattern = %check.pattern,
        schema = %check.schema,
        files = outcome.files,
        documents = outcome.documents,
        violations = outcome.violations,
        "check {}",
        if outcome.passed() { "passed" } else { "failed" }
    );
    Ok(outcome)
}

/// Validate every document in `files` with `validator`.
fn check_files<V: Validate, W: Write>(
    validator: &V,
    check: &Check,
    root: &Path,
    files: &[PathBuf],
    out: &mut W,
) -> Result<CheckOutcome, CheckError> {
    let mut outcome = CheckOutcome::new(check);

    for path in files {
        tracing::debug!(file = %path.display(), "validating");
        outcome.files += 1;

        let display = path.strip_prefix(root).unwrap_or(path).display();
        for document in read_documents(path)? {
            let document = document?;
            outcome.documents += 1;

            for violation in validator.validate(&document.value) {
                outcome.violations += 1;
                let written = match document.line {
                    Some(line) => writeln!(out, "[{display}:{line}] {}", violation.message),
                    None => writeln!(out, "[{display}] {}", violation.message),
                };
                written.map_err(CheckError::Report)?;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SCHEMA_SUFFIX;
    use crate::violation::{InstancePath, Violation};
    use serde_json::{json, Value};

    const ID_SCHEMA: &str =
        r#"{"type":"object","required":["id"],"properties":{"id":{"type":"string"}}}"#;

    /// A repository root with `schemas/` and `data/`.
    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("schemas")).unwrap();
            std::fs::create_dir_all(dir.path().join("data")).unwrap();
            Self { dir }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn schema(&self, name: &str, body: &str) -> &Self {
            std::fs::write(
                self.root().join("schemas").join(format!("{name}{SCHEMA_SUFFIX}")),
                body,
            )
            .unwrap();
            self
        }

        fn data(&self, rel: &str, body: &str) -> &Self {
            std::fs::write(self.root().join(rel), body).unwrap();
            self
        }

        fn registry(&self) -> SchemaRegistry {
            SchemaRegistry::new(self.root().join("schemas"))
        }

        fn run(&self, check: &Check) -> (Result<CheckOutcome, CheckError>, String) {
            let mut out = Vec::new();
            let result = run_check(&mut self.registry(), self.root(), check, &mut out);
            (result, String::from_utf8(out).unwrap())
        }
    }

    #[test]
    fn test_default_plan_order() {
        let plan = CheckPlan::default();
        let pairs: Vec<(&str, &str)> = plan
            .checks
            .iter()
            .map(|c| (c.pattern.as_str(), c.schema.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("data/objectives.jsonl", "objective"),
                ("data/projects.jsonl", "project"),
                ("data/tasks.jsonl", "task"),
                ("data/runs.jsonl", "run"),
                ("data/policies.jsonl", "policy"),
                ("data/routing.json", "routing"),
            ]
        );
    }

    #[test]
    fn test_type_mismatch_in_jsonl_is_reported_with_line() {
        let fx = Fixture::new();
        fx.schema("task", ID_SCHEMA).data("data/tasks.jsonl", "{\"id\": 1}\n");

        let (result, out) = fx.run(&Check::new("data/tasks.jsonl", "task"));
        let outcome = result.unwrap();
        assert!(!outcome.passed());
        assert_eq!(outcome.violations, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[data/tasks.jsonl:1] "), "got: {out}");
        assert!(lines[0].contains("is not of type"), "got: {out}");
    }

    #[test]
    fn test_valid_whole_file_passes() {
        let fx = Fixture::new();
        fx.schema("routing", ID_SCHEMA).data("data/routing.json", "{\"id\": \"abc\"}");

        let (result, out) = fx.run(&Check::new("data/routing.json", "routing"));
        let outcome = result.unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.files, 1);
        assert_eq!(outcome.documents, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_whole_file_violation_has_no_line_number() {
        let fx = Fixture::new();
        fx.schema("routing", ID_SCHEMA).data("data/routing.json", "{}");

        let (result, out) = fx.run(&Check::new("data/routing.json", "routing"));
        assert!(!result.unwrap().passed());
        assert!(out.starts_with("[data/routing.json] "), "got: {out}");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let fx = Fixture::new();
        fx.schema("task", ID_SCHEMA)
            .data("data/tasks.jsonl", "{\"id\":\"a\"}\n\n{\"id\":\"b\"}\n");

        let (result, out) = fx.run(&Check::new("data/tasks.jsonl", "task"));
        let outcome = result.unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.documents, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_matching_files_passes_vacuously() {
        let fx = Fixture::new();
        fx.schema("run", ID_SCHEMA);

        let (result, out) = fx.run(&Check::new("data/runs.jsonl", "run"));
        let outcome = result.unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.files, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_line_aborts() {
        let fx = Fixture::new();
        fx.schema("task", ID_SCHEMA).data("data/tasks.jsonl", "{id: }\n");

        let (result, out) = fx.run(&Check::new("data/tasks.jsonl", "task"));
        assert!(matches!(
            result,
            Err(CheckError::DocumentParse { line: Some(1), .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_violations_before_malformed_line_are_still_reported() {
        let fx = Fixture::new();
        fx.schema("task", ID_SCHEMA)
            .data("data/tasks.jsonl", "{\"id\": 7}\n{id: }\n");

        let (result, out) = fx.run(&Check::new("data/tasks.jsonl", "task"));
        assert!(result.is_err());
        assert!(out.starts_with("[data/tasks.jsonl:1] "), "got: {out}");
    }

    #[test]
    fn test_missing_schema_aborts() {
        let fx = Fixture::new();
        fx.data("data/tasks.jsonl", "{\"id\": \"a\"}\n");
        let (result, _) = fx.run(&Check::new("data/tasks.jsonl", "task"));
        assert!(matches!(result, Err(CheckError::SchemaLoad { .. })));
    }

    #[test]
    fn test_errors_reported_in_file_then_line_order() {
        let fx = Fixture::new();
        fx.schema("policy", ID_SCHEMA)
            .data("data/policies-b.jsonl", "{}\n")
            .data("data/policies-a.jsonl", "{\"id\": 1}\n{\"id\": \"ok\"}\n{\"id\": []}\n");

        let (result, out) = fx.run(&Check::new("data/policies-*.jsonl", "policy"));
        let outcome = result.unwrap();
        assert_eq!(outcome.files, 2);
        assert_eq!(outcome.documents, 4);
        assert_eq!(outcome.violations, 3);

        let prefixes: Vec<&str> = out
            .lines()
            .map(|l| l.split(' ').next().unwrap())
            .collect();
        assert_eq!(
            prefixes,
            vec![
                "[data/policies-a.jsonl:1]",
                "[data/policies-a.jsonl:3]",
                "[data/policies-b.jsonl:1]",
            ]
        );
    }

    #[test]
    fn test_run_plan_runs_every_check_after_failure() {
        let fx = Fixture::new();
        fx.schema("objective", ID_SCHEMA)
            .schema("project", ID_SCHEMA)
            .data("data/objectives.jsonl", "{}\n")
            .data("data/projects.jsonl", "{\"id\": 5}\n");

        let plan = CheckPlan {
            checks: vec![
                Check::new("data/objectives.jsonl", "objective"),
                Check::new("data/projects.jsonl", "project"),
            ],
        };
        let mut out = Vec::new();
        let outcome = run_plan(&mut fx.registry(), fx.root(), &plan, &mut out).unwrap();
        assert_eq!(outcome.checks.len(), 2);
        assert!(!outcome.checks[0].passed());
        assert!(!outcome.checks[1].passed());
        assert!(!outcome.passed());
        assert_eq!(outcome.violations(), 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_run_plan_passes_when_all_checks_pass() {
        let fx = Fixture::new();
        fx.schema("objective", ID_SCHEMA)
            .data("data/objectives.jsonl", "{\"id\": \"o-1\"}\n");

        let plan = CheckPlan {
            checks: vec![
                Check::new("data/objectives.jsonl", "objective"),
                Check::new("data/missing.jsonl", "objective"),
            ],
        };
        let mut out = Vec::new();
        let outcome = run_plan(&mut fx.registry(), fx.root(), &plan, &mut out).unwrap();
        assert!(outcome.passed());
        assert!(out.is_empty());
    }

    #[test]
    fn test_plan_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.yaml");
        std::fs::write(
            &path,
            "checks:\n  - pattern: data/tasks.jsonl\n    schema: task\n  - pattern: data/routing.json\n    schema: routing\n",
        )
        .unwrap();

        let plan = CheckPlan::from_file(&path).unwrap();
        assert_eq!(
            plan.checks,
            vec![
                Check::new("data/tasks.jsonl", "task"),
                Check::new("data/routing.json", "routing"),
            ]
        );
    }

    #[test]
    fn test_plan_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.json");
        std::fs::write(&path, r#"{"checks": [{"pattern": "data/*.jsonl", "schema": "run"}]}"#)
            .unwrap();
        let plan = CheckPlan::from_file(&path).unwrap();
        assert_eq!(plan.checks, vec![Check::new("data/*.jsonl", "run")]);
    }

    #[test]
    fn test_plan_with_wrong_shape_is_plan_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.yaml");
        std::fs::write(&path, "checks: not-a-list\n").unwrap();
        assert!(matches!(
            CheckPlan::from_file(&path),
            Err(CheckError::Plan { .. })
        ));
    }

    /// Reports a fixed violation set for every document.
    struct FixedValidator(Vec<Violation>);

    impl Validate for FixedValidator {
        fn validate(&self, _document: &Value) -> Vec<Violation> {
            self.0.clone()
        }
    }

    #[test]
    fn test_check_files_prints_every_violation_message() {
        let fx = Fixture::new();
        fx.data("data/routing.json", "{}");
        let validator = FixedValidator(vec![
            Violation {
                path: InstancePath::root(),
                message: "first".to_string(),
            },
            Violation {
                path: InstancePath::from_pointer("/a", &json!({"a": 1})),
                message: "second".to_string(),
            },
        ]);

        let check = Check::new("data/routing.json", "routing");
        let files = vec![fx.root().join("data/routing.json")];
        let mut out = Vec::new();
        let outcome = check_files(&validator, &check, fx.root(), &files, &mut out).unwrap();
        assert_eq!(outcome.violations, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[data/routing.json] first\n[data/routing.json] second\n"
        );
    }
}
