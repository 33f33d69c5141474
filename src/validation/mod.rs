//! Field validation.
//!
//! A [`ValidationRule`] names a validator by its discriminator
//! (`validation_type`). The [`ValidatorRegistry`] dispatches on exact match;
//! the [`FieldValidationService`] wraps dispatch with placeholder resolution
//! for the rule's message templates.
//!
//! Built-in validators:
//! - `LocationInsideRegion`: coordinate field inside the dependency's region
//! - `RegionContainment`: field region inside the dependency's region
//! - `ConditionalRequired`: field required while the dependency matches

mod registry;
mod service;
mod spatial;
mod types;
pub mod validators;

pub use registry::{FieldValidator, ValidatorRegistry};
pub use service::FieldValidationService;
pub use spatial::{InMemoryRegions, Region, SpatialContainment, SpatialError};
pub use types::{
    FieldValidationResult, RuleId, ValidationContext, ValidationRule, ValidatorOutcome,
};
pub use validators::{ComparisonOperator, ConditionalRequired, LocationInsideRegion, RegionContainment};
