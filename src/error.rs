//! Caller-level error type.
//!
//! Per-path and per-rule problems are reported as data (see
//! [`ResolutionError`](crate::resolution::ResolutionError) and
//! [`ValidatorOutcome`](crate::validation::ValidatorOutcome)). `WaymarkError`
//! is reserved for requests that cannot be processed at all.

use thiserror::Error;

use crate::config::SettingsError;
use crate::dependency::FieldId;
use crate::snapshot::SnapshotError;
use crate::store::StoreError;

/// Result type for waymark operations.
pub type Result<T> = std::result::Result<T, WaymarkError>;

/// Errors that short-circuit a whole call.
#[derive(Error, Debug)]
pub enum WaymarkError {
    /// The input is not a well-formed placeholder path.
    #[error("malformed path '{input}': {reason}")]
    MalformedPath {
        /// The raw input as supplied.
        input: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A resolution request named no paths at all.
    #[error("resolution request contains no paths")]
    EmptyRequest,

    /// The entity type is unknown to the metadata registry.
    #[error("unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// No validator is registered for the rule's discriminator.
    #[error("unknown validation type: '{0}'")]
    UnknownValidationType(String),

    /// A rule's configuration could not be understood by its validator.
    #[error("invalid configuration for '{validation_type}': {message}")]
    InvalidConfiguration {
        validation_type: String,
        message: String,
    },

    /// Persisting the dependency edge would close a cycle.
    #[error(
        "circular dependency: field {field_id} cannot depend on field {depends_on} ({})",
        format_chain(.chain)
    )]
    CircularDependency {
        field_id: FieldId,
        depends_on: FieldId,
        /// The closed loop, starting and ending at `field_id`.
        chain: Vec<FieldId>,
    },

    /// A template still references tokens with no resolved value.
    #[error("unresolved placeholders: {}", .0.join(", "))]
    UnresolvedPlaceholders(Vec<String>),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl WaymarkError {
    /// Create a malformed path error.
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(
        validation_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            validation_type: validation_type.into(),
            message: message.into(),
        }
    }
}

fn format_chain(chain: &[FieldId]) -> String {
    chain
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
