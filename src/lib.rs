//! # Waymark
//!
//! Layered placeholder resolution and field validation for dynamic forms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Message templates  "{Town.Districts.Count}"       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [path parser]
//! ┌─────────────────────────────────────────────────────────┐
//! │        PathExpression (Layer 0 / 1 / 2 / 3)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [placeholder resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Path resolution engine                                 │
//! │   metadata registry ──► prefetch plan ──► entity store   │
//! │   (one fetch per root entity)                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [field validation service]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Validator registry: LocationInsideRegion,              │
//! │   RegionContainment, ConditionalRequired, custom         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`dependency`] module guards rule edits against circular field
//! dependencies.

pub mod config;
pub mod dependency;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod path;
pub mod resolution;
pub mod snapshot;
pub mod store;
pub mod validation;
pub mod value;

pub use error::{Result, WaymarkError};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::dependency::{CycleDetector, DependencyEdge, FieldId};
    pub use crate::error::{Result, WaymarkError};
    pub use crate::metadata::{EntityMetadataRegistry, EntitySchema, InMemoryMetadataRegistry};
    pub use crate::path::{parse, AggregateOperator, PathExpression, ResolutionLayer};
    pub use crate::resolution::{
        extract_placeholders, interpolate, PathResolutionEngine, PlaceholderResolver,
        ResolutionErrorKind, ResolutionRequest, ResolutionResult,
    };
    pub use crate::store::{EntityId, EntityStore, InMemoryEntityStore, StoredEntity};
    pub use crate::validation::{
        FieldValidationService, FieldValidator, ValidationRule, ValidatorOutcome,
        ValidatorRegistry,
    };
    pub use crate::value::FieldValue;
}
