//! Request and result types for placeholder resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::EntityId;

/// Why a single path could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionErrorKind {
    /// The path does not parse, or the schema has no such property/navigation.
    InvalidPath,
    /// A foreign key or required value is unset.
    DependencyNotFilled,
    /// The chain broke mid-traversal (related entity missing, store failure).
    NavigationFailed,
    /// `First`/`Last` (or a numeric aggregate) over an empty collection.
    AggregateEmpty,
    /// A numeric aggregate over non-numeric elements.
    AggregateTypeMismatch,
}

impl ResolutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionErrorKind::InvalidPath => "InvalidPath",
            ResolutionErrorKind::DependencyNotFilled => "DependencyNotFilled",
            ResolutionErrorKind::NavigationFailed => "NavigationFailed",
            ResolutionErrorKind::AggregateEmpty => "AggregateEmpty",
            ResolutionErrorKind::AggregateTypeMismatch => "AggregateTypeMismatch",
        }
    }
}

impl fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-path failure, returned alongside the values that did resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionError {
    pub path: String,
    pub kind: ResolutionErrorKind,
    pub detail: String,
}

impl ResolutionError {
    pub fn new(path: impl Into<String>, kind: ResolutionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(path, ResolutionErrorKind::InvalidPath, detail)
    }

    pub fn dependency_not_filled(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(path, ResolutionErrorKind::DependencyNotFilled, detail)
    }

    pub fn navigation_failed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(path, ResolutionErrorKind::NavigationFailed, detail)
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind, self.detail)
    }
}

/// Values supplied by the caller for Layer 0 paths.
pub type KnownValues = BTreeMap<String, String>;

/// A batch of paths rooted at one entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    pub entity_type_name: String,
    pub entity_id: EntityId,
    pub paths: Vec<String>,
    #[serde(default)]
    pub known_values: KnownValues,
}

impl ResolutionRequest {
    pub fn new(entity_type_name: impl Into<String>, entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_type_name: entity_type_name.into(),
            entity_id: entity_id.into(),
            paths: Vec::new(),
            known_values: KnownValues::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn with_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_known_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.known_values.insert(key.into(), value.into());
        self
    }

    pub fn with_known_values(mut self, values: KnownValues) -> Self {
        self.known_values.extend(values);
        self
    }
}

/// Outcome of a resolution call.
///
/// Every requested path ends up in exactly one of `values` or `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub values: BTreeMap<String, String>,
    pub errors: Vec<ResolutionError>,
}

impl ResolutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_value(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.values.insert(path.into(), value.into());
    }

    pub fn push_error(&mut self, error: ResolutionError) {
        self.errors.push(error);
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ResolutionResult) {
        self.values.extend(other.values);
        self.errors.extend(other.errors);
    }

    pub fn value(&self, path: &str) -> Option<&str> {
        self.values.get(path).map(String::as_str)
    }

    pub fn error(&self, path: &str) -> Option<&ResolutionError> {
        self.errors.iter().find(|e| e.path == path)
    }

    /// True when no path failed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of paths accounted for (values + errors).
    pub fn len(&self) -> usize {
        self.values.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.errors.is_empty()
    }
}
