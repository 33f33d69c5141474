//! Built-in validators.

mod conditional_required;
mod location_inside_region;
mod region_containment;

pub use conditional_required::{ComparisonOperator, ConditionalRequired};
pub use location_inside_region::LocationInsideRegion;
pub use region_containment::RegionContainment;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{ValidationContext, ValidatorOutcome};
use crate::error::{Result, WaymarkError};
use crate::value::FieldValue;

/// Deserialize a rule configuration. A missing configuration reads as `{}`.
fn read_config<T: DeserializeOwned>(validation_type: &str, configuration: &Value) -> Result<T> {
    let configuration = match configuration {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(configuration)
        .map_err(|err| WaymarkError::invalid_configuration(validation_type, err.to_string()))
}

/// A present, non-null value.
fn present(value: Option<&FieldValue>) -> Option<&FieldValue> {
    value.filter(|v| !v.is_null())
}

/// Non-blank text at `path` below `value`.
fn text_at(value: &FieldValue, path: &str) -> Option<String> {
    value
        .get_path(path)
        .and_then(|v| v.as_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Failed outcome for an absent field or dependency value.
fn dependency_missing(ctx: &ValidationContext, missing: &str) -> ValidatorOutcome {
    ctx.outcome(false)
        .with_metadata("failure", "dependencyMissing")
        .with_metadata("missing", missing)
}
