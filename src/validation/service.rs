//! Field validation orchestration.
//!
//! ```text
//!   rule ──► placeholders of both templates ──► PlaceholderResolver
//!     │                                              │ navigation values
//!     └──► ValidatorRegistry (raw field/dependency)  │
//!                     │ computed placeholders ───────┴──► merged map
//! ```
//!
//! The outcome's template is returned as is; callers interpolate.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::registry::ValidatorRegistry;
use super::types::{FieldValidationResult, ValidationContext, ValidationRule, ValidatorOutcome};
use crate::config::ValidationSettings;
use crate::error::{Result, WaymarkError};
use crate::metadata::EntityMetadataRegistry;
use crate::resolution::{
    extract_placeholders, KnownValues, PlaceholderResolver, ResolutionRequest, ResolutionResult,
};
use crate::store::{EntityId, EntityStore};
use crate::value::FieldValue;

/// Runs validation rules and gathers the placeholder values their messages need.
pub struct FieldValidationService<M, S> {
    resolver: PlaceholderResolver<M, S>,
    validators: ValidatorRegistry,
    settings: ValidationSettings,
}

impl<M, S> FieldValidationService<M, S>
where
    M: EntityMetadataRegistry,
    S: EntityStore,
{
    pub fn new(resolver: PlaceholderResolver<M, S>, validators: ValidatorRegistry) -> Self {
        Self {
            resolver,
            validators,
            settings: ValidationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn resolver(&self) -> &PlaceholderResolver<M, S> {
        &self.resolver
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    /// Validate one field against one rule.
    ///
    /// Fails only for an unknown validation type, an invalid rule
    /// configuration or an unresolvable entity type. Placeholders that cannot
    /// be resolved are listed in `resolution_errors`.
    #[instrument(
        skip_all,
        fields(rule_id = rule.id, validation_type = %rule.validation_type, entity_id = %entity_id)
    )]
    pub async fn validate(
        &self,
        rule: &ValidationRule,
        field: Option<&FieldValue>,
        dependency: Option<&FieldValue>,
        known_placeholders: &KnownValues,
        entity_id: &EntityId,
    ) -> Result<FieldValidationResult> {
        let validator = self
            .validators
            .get(&rule.validation_type)
            .ok_or_else(|| WaymarkError::UnknownValidationType(rule.validation_type.clone()))?;

        let resolution = self
            .resolve_placeholders(rule, known_placeholders, entity_id)
            .await?;

        let ctx = ValidationContext::for_rule(rule, &self.settings);
        let outcome = if rule.requires_dependency_filled
            && dependency.map_or(true, |value| value.is_empty(false))
        {
            debug!("dependency not filled, validator skipped");
            ValidatorOutcome::new(true, rule.success_message_template.clone())
                .with_metadata("skipped", "dependencyNotFilled")
        } else {
            validator
                .validate(field, dependency, &rule.configuration, &ctx)
                .await?
        };

        let mut placeholders: BTreeMap<String, String> = resolution.values;
        placeholders.extend(
            outcome
                .computed_placeholders
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let resolution_errors = resolution
            .errors
            .into_iter()
            .filter(|error| !placeholders.contains_key(&error.path))
            .collect();

        debug!(is_valid = outcome.is_valid, "rule evaluated");
        Ok(FieldValidationResult {
            rule_id: rule.id,
            outcome,
            placeholders,
            resolution_errors,
        })
    }

    /// Validate one field against its rules in order.
    ///
    /// Stops after the first failing blocking rule; results of the rules run
    /// so far are returned.
    pub async fn validate_all(
        &self,
        rules: &[ValidationRule],
        field: Option<&FieldValue>,
        dependency: Option<&FieldValue>,
        known_placeholders: &KnownValues,
        entity_id: &EntityId,
    ) -> Result<Vec<FieldValidationResult>> {
        let mut results = Vec::with_capacity(rules.len());
        for rule in rules {
            let result = self
                .validate(rule, field, dependency, known_placeholders, entity_id)
                .await?;
            let stop = rule.is_blocking && !result.is_valid();
            results.push(result);
            if stop {
                debug!(rule_id = rule.id, "blocking rule failed, remaining rules skipped");
                break;
            }
        }
        Ok(results)
    }

    async fn resolve_placeholders(
        &self,
        rule: &ValidationRule,
        known_placeholders: &KnownValues,
        entity_id: &EntityId,
    ) -> Result<ResolutionResult> {
        let mut paths = extract_placeholders(&rule.error_message_template);
        for path in extract_placeholders(&rule.success_message_template) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Ok(ResolutionResult::new());
        }

        let request = ResolutionRequest::new(rule.entity_type_name.clone(), entity_id.clone())
            .with_paths(paths)
            .with_known_values(known_placeholders.clone());
        self.resolver.resolve_all(&request).await
    }
}
