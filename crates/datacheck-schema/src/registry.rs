//! # Schema Registry
//!
//! Loads JSON Schema (Draft 2020-12) documents by name from the schema
//! directory and compiles them into validators. A schema named `task` lives
//! at `<schema_dir>/task.schema.json`.
//!
//! ## Caching
//!
//! Each schema is read and compiled at most once per registry. Repeated
//! checks against the same schema reuse the compiled validator.
//!
//! ## Reference Resolution
//!
//! Cross-schema `$ref`s resolve against the other `*.schema.json` files in
//! the schema directory, either by their `$id` or by file name. Nothing is
//! ever fetched over the network: a reference that does not resolve locally
//! fails compilation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::CheckError;
use crate::violation::CompiledSchema;

/// File suffix shared by every schema document.
pub const SCHEMA_SUFFIX: &str = ".schema.json";

// ---------------------------------------------------------------------------
// Local $ref retriever
// ---------------------------------------------------------------------------

/// Resolves `$ref` URIs against schemas already on disk.
struct LocalSchemaRetriever {
    /// Map from `$id` URI or bare file name to schema JSON.
    schemas: Arc<HashMap<String, Value>>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.schemas
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// Named, cached access to the schemas in one directory.
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    compiled: HashMap<String, CompiledSchema>,
    /// Reference index, built on first compile.
    references: Option<Arc<HashMap<String, Value>>>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schema_dir", &self.schema_dir)
            .field("compiled", &self.compiled.len())
            .finish()
    }
}

impl SchemaRegistry {
    /// Create a registry over `schema_dir`. Nothing is read until the first
    /// call to [`load`](Self::load).
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            compiled: HashMap::new(),
            references: None,
        }
    }

    /// Path a schema with this name is loaded from.
    pub fn schema_path(&self, name: &str) -> PathBuf {
        self.schema_dir.join(format!("{name}{SCHEMA_SUFFIX}"))
    }

    /// Number of schemas compiled so far.
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    /// Load and compile the named schema, or return the cached validator.
    ///
    /// # Errors
    ///
    /// - [`CheckError::SchemaLoad`] if the file is missing, unreadable, or
    ///   not valid JSON.
    /// - [`CheckError::SchemaCompile`] if the document is not a valid JSON
    ///   Schema or one of its `$ref`s cannot be resolved locally.
    pub fn load(&mut self, name: &str) -> Result<&CompiledSchema, CheckError> {
        if !self.compiled.contains_key(name) {
            let compiled = self.compile(name)?;
            self.compiled.insert(name.to_string(), compiled);
        }
        Ok(&self.compiled[name])
    }

    fn compile(&mut self, name: &str) -> Result<CompiledSchema, CheckError> {
        let path = self.schema_path(name);
        let schema = read_schema(&path)?;

        let retriever = LocalSchemaRetriever {
            schemas: self.references(),
        };

        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .with_retriever(retriever)
            .build(&schema)
            .map_err(|e| CheckError::SchemaCompile {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(schema = name, path = %path.display(), "compiled schema");
        Ok(CompiledSchema::new(name, validator))
    }

    /// Reference index over every parseable schema in the directory.
    fn references(&mut self) -> Arc<HashMap<String, Value>> {
        if let Some(index) = &self.references {
            return Arc::clone(index);
        }

        let mut index = HashMap::new();
        for path in schema_files(&self.schema_dir) {
            let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            match read_schema(&path) {
                Ok(schema) => {
                    if let Some(id) = schema.get("$id").and_then(Value::as_str) {
                        index.insert(id.to_string(), schema.clone());
                    }
                    index.insert(filename.to_string(), schema);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping schema in reference index");
                }
            }
        }

        let index = Arc::new(index);
        self.references = Some(Arc::clone(&index));
        index
    }
}

fn read_schema(path: &Path) -> Result<Value, CheckError> {
    let content = std::fs::read_to_string(path).map_err(|e| CheckError::SchemaLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| CheckError::SchemaLoad {
        path: path.to_path_buf(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// `*.schema.json` files directly inside `dir`, sorted.
fn schema_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read schema directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .is_some_and(|name| name.ends_with(SCHEMA_SUFFIX))
        })
        .collect();
    files.sort();
    files
}
