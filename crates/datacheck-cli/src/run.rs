//! # Run Command
//!
//! Executes a check plan against a repository root and maps the outcome to
//! a process exit code.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use datacheck_schema::{run_plan, CheckPlan, SchemaRegistry};

/// Every document conformed to its schema.
pub const EXIT_OK: u8 = 0;
/// At least one schema violation was reported.
pub const EXIT_VIOLATIONS: u8 = 1;
/// The run could not complete (missing schema, malformed data, bad plan).
pub const EXIT_ERROR: u8 = 2;

/// Arguments controlling what gets validated.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Repository root containing `schemas/` and `data/`.
    /// Defaults to the nearest ancestor of the current directory with `schemas/`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// YAML or JSON file listing the checks to run instead of the defaults.
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,
}

/// Execute the run, writing violation lines to `out`.
///
/// Returns [`EXIT_OK`] or [`EXIT_VIOLATIONS`]. Operational failures are
/// returned as errors for the caller to map to [`EXIT_ERROR`].
pub fn run_checks<W: Write>(args: &RunArgs, cwd: &Path, out: &mut W) -> Result<u8> {
    let root = match &args.root {
        Some(root) => crate::resolve_path(root, cwd),
        None => crate::resolve_repo_root(cwd).unwrap_or_else(|| {
            tracing::warn!("no schemas/ directory above the current directory; using it as root");
            cwd.to_path_buf()
        }),
    };
    tracing::debug!(root = %root.display(), "resolved repository root");

    let plan = match &args.plan {
        Some(path) => {
            let path = crate::resolve_path(path, cwd);
            CheckPlan::from_file(&path)?
        }
        None => CheckPlan::default(),
    };

    let mut registry = SchemaRegistry::new(root.join("schemas"));
    let outcome = run_plan(&mut registry, &root, &plan, out).context("validation aborted")?;
    out.flush().context("failed to flush report")?;

    tracing::info!(
        checks = outcome.checks.len(),
        violations = outcome.violations(),
        schemas = registry.compiled_count(),
        "run complete"
    );

    if outcome.passed() {
        Ok(EXIT_OK)
    } else {
        Ok(EXIT_VIOLATIONS)
    }
}
