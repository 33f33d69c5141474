//! Validator trait and the discriminator-keyed registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::spatial::SpatialContainment;
use super::types::{ValidationContext, ValidatorOutcome};
use super::validators::{ConditionalRequired, LocationInsideRegion, RegionContainment};
use crate::error::{Result, WaymarkError};
use crate::value::FieldValue;

/// A pluggable validator selected by its `validation_type`.
///
/// Values may arrive in any [`FieldValue`] representation; `None` means the
/// caller had no value at all.
#[async_trait]
pub trait FieldValidator: Send + Sync {
    /// Discriminator matched exactly against `ValidationRule::validation_type`.
    fn validation_type(&self) -> &str;

    async fn validate(
        &self,
        field: Option<&FieldValue>,
        dependency: Option<&FieldValue>,
        configuration: &Value,
        ctx: &ValidationContext,
    ) -> Result<ValidatorOutcome>;
}

/// Validators keyed by discriminator.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn FieldValidator>>,
}

impl ValidatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the three built-in validators.
    pub fn with_builtins(spatial: Arc<dyn SpatialContainment>) -> Self {
        let mut registry = Self::new();
        registry.register(LocationInsideRegion::new(spatial.clone()));
        registry.register(RegionContainment::new(spatial));
        registry.register(ConditionalRequired);
        registry
    }

    /// Add a validator, returning the one it replaced.
    pub fn register<V>(&mut self, validator: V) -> Option<Arc<dyn FieldValidator>>
    where
        V: FieldValidator + 'static,
    {
        let validator: Arc<dyn FieldValidator> = Arc::new(validator);
        self.validators
            .insert(validator.validation_type().to_string(), validator)
    }

    pub fn get(&self, validation_type: &str) -> Option<Arc<dyn FieldValidator>> {
        self.validators.get(validation_type).cloned()
    }

    pub fn contains(&self, validation_type: &str) -> bool {
        self.validators.contains_key(validation_type)
    }

    /// Registered discriminators, sorted.
    pub fn validation_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Dispatch to the validator registered for `validation_type`.
    pub async fn validate(
        &self,
        validation_type: &str,
        field: Option<&FieldValue>,
        dependency: Option<&FieldValue>,
        configuration: &Value,
        ctx: &ValidationContext,
    ) -> Result<ValidatorOutcome> {
        let validator = self
            .get(validation_type)
            .ok_or_else(|| WaymarkError::UnknownValidationType(validation_type.to_string()))?;
        validator.validate(field, dependency, configuration, ctx).await
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validation_types", &self.validation_types())
            .finish()
    }
}
