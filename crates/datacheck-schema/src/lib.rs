//! # datacheck-schema — Data File Validation
//!
//! Validates the repository's JSON and JSON-Lines data files against JSON
//! Schema (Draft 2020-12) documents stored in `schemas/`.
//!
//! ## Modules
//!
//! - [`registry`] — loads `schemas/<name>.schema.json`, compiles and caches
//!   validators, resolves cross-schema `$ref`s locally.
//! - [`discover`] — expands glob-style file patterns.
//! - [`document`] — parses whole-file JSON and line-delimited JSON.
//! - [`violation`] — violation paths, ordering, and the [`Validate`] seam.
//! - [`check`] — runs checks and plans, writing one report line per
//!   violation.
//!
//! ## Crate Policy
//!
//! - Schema violations are data, reported and counted; every other failure
//!   is a [`CheckError`] that aborts the run.
//! - Report output is deterministic for a given filesystem snapshot: files
//!   in sorted order, lines in file order, violations in path order.

pub mod check;
pub mod discover;
pub mod document;
pub mod error;
pub mod registry;
pub mod violation;

pub use check::{run_check, run_plan, Check, CheckOutcome, CheckPlan, RunOutcome};
pub use discover::FilePattern;
pub use document::{read_documents, Document, DocumentFormat};
pub use error::CheckError;
pub use registry::SchemaRegistry;
pub use violation::{CompiledSchema, InstancePath, PathSegment, Validate, Violation};
