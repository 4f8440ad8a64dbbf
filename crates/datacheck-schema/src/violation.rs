//! # Violations and the Validator Boundary
//!
//! A [`Violation`] is one schema-rule failure: where in the document it
//! happened ([`InstancePath`]) and what went wrong. The [`Validate`] trait is
//! the single capability the rest of the crate needs from a schema library.
//! [`CompiledSchema`] provides it on top of the `jsonschema` crate.
//!
//! ## Ordering
//!
//! Violations are always returned sorted by path so that reports are stable
//! and diff-friendly regardless of the order in which the library discovers
//! them. Violations at the same path keep their discovery order.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Instance paths
// ---------------------------------------------------------------------------

/// One step into a JSON document.
///
/// Variant order defines the sort order: an array index sorts before an
/// object key at the same depth.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Position within an array.
    Index(usize),
    /// Member name within an object.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => write!(f, "{}", k.replace('~', "~0").replace('/', "~1")),
        }
    }
}

/// Location of a value inside a JSON document.
///
/// Compares lexicographically by segment; the root path sorts first and a
/// path sorts before any of its extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstancePath(Vec<PathSegment>);

impl InstancePath {
    /// The path of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Decode a JSON Pointer (RFC 6901) reported against `instance`.
    ///
    /// Numeric tokens become [`PathSegment::Index`] only where the value
    /// being stepped into is an array, so an object key such as `"0"` stays
    /// a key.
    pub fn from_pointer(pointer: &str, instance: &Value) -> Self {
        let Some(rest) = pointer.strip_prefix('/') else {
            return Self::root();
        };

        let mut segments = Vec::new();
        let mut current = Some(instance);
        for raw in rest.split('/') {
            let token = raw.replace("~1", "/").replace("~0", "~");
            let segment = match current {
                Some(Value::Array(_)) => match token.parse::<usize>() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(token),
                },
                _ => PathSegment::Key(token),
            };
            current = current.and_then(|v| match &segment {
                PathSegment::Index(i) => v.get(*i),
                PathSegment::Key(k) => v.get(k.as_str()),
            });
            segments.push(segment);
        }
        Self(segments)
    }

    /// The individual segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl From<Vec<PathSegment>> for InstancePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

/// Renders as a JSON Pointer (`""` for the root).
impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending value in the document.
    pub path: InstancePath,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// Order by path only.
    pub fn cmp_by_path(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

// ---------------------------------------------------------------------------
// Validator boundary
// ---------------------------------------------------------------------------

/// Validate a parsed document against a bound schema.
pub trait Validate {
    /// Every violation in `document`, sorted by path. Empty means the
    /// document conforms.
    fn validate(&self, document: &Value) -> Vec<Violation>;
}

/// A schema compiled by the `jsonschema` crate (Draft 2020-12).
pub struct CompiledSchema {
    name: String,
    validator: jsonschema::Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    pub(crate) fn new(name: impl Into<String>, validator: jsonschema::Validator) -> Self {
        Self {
            name: name.into(),
            validator,
        }
    }

    /// Name the schema was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Validate for CompiledSchema {
    fn validate(&self, document: &Value) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|err| Violation {
                path: InstancePath::from_pointer(&err.instance_path.to_string(), document),
                message: err.to_string(),
            })
            .collect();
        violations.sort_by(Violation::cmp_by_path);
        violations
    }
}
