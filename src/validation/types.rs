//! Rule, context and outcome types shared by validators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ValidationSettings;
use crate::dependency::FieldId;
use crate::error::Result;
use crate::resolution::{interpolate, ResolutionError};

/// Identifier of a validation rule.
pub type RuleId = i64;

/// A persisted validation rule, read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub id: RuleId,

    /// Entity type that owns the validated field; placeholders are resolved
    /// against it.
    pub entity_type_name: String,

    /// Discriminator selecting the validator.
    pub validation_type: String,

    /// Validator-specific configuration.
    #[serde(default)]
    pub configuration: Value,

    #[serde(default)]
    pub error_message_template: String,

    #[serde(default)]
    pub success_message_template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on_field_id: Option<FieldId>,

    #[serde(default)]
    pub is_blocking: bool,

    /// Skip the validator while the dependency value is empty.
    #[serde(default)]
    pub requires_dependency_filled: bool,
}

impl ValidationRule {
    pub fn new(
        id: RuleId,
        entity_type_name: impl Into<String>,
        validation_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            entity_type_name: entity_type_name.into(),
            validation_type: validation_type.into(),
            configuration: Value::Null,
            error_message_template: String::new(),
            success_message_template: String::new(),
            depends_on_field_id: None,
            is_blocking: false,
            requires_dependency_filled: false,
        }
    }

    pub fn with_configuration(mut self, configuration: Value) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_error_message(mut self, template: impl Into<String>) -> Self {
        self.error_message_template = template.into();
        self
    }

    pub fn with_success_message(mut self, template: impl Into<String>) -> Self {
        self.success_message_template = template.into();
        self
    }

    pub fn depends_on(mut self, field_id: FieldId) -> Self {
        self.depends_on_field_id = Some(field_id);
        self
    }

    pub fn blocking(mut self, is_blocking: bool) -> Self {
        self.is_blocking = is_blocking;
        self
    }

    pub fn requires_dependency(mut self, required: bool) -> Self {
        self.requires_dependency_filled = required;
        self
    }
}

/// What a validator decided. The message template is never interpolated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOutcome {
    pub is_valid: bool,
    pub message_template: String,
    #[serde(default)]
    pub computed_placeholders: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl ValidatorOutcome {
    pub fn new(is_valid: bool, message_template: impl Into<String>) -> Self {
        Self {
            is_valid,
            message_template: message_template.into(),
            computed_placeholders: BTreeMap::new(),
            metadata: None,
        }
    }

    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.computed_placeholders.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

/// Everything a validator may need besides the values themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationContext {
    pub error_message_template: String,
    pub success_message_template: String,
    pub settings: ValidationSettings,
}

impl ValidationContext {
    pub fn new(
        error_message_template: impl Into<String>,
        success_message_template: impl Into<String>,
    ) -> Self {
        Self {
            error_message_template: error_message_template.into(),
            success_message_template: success_message_template.into(),
            settings: ValidationSettings::default(),
        }
    }

    pub fn for_rule(rule: &ValidationRule, settings: &ValidationSettings) -> Self {
        Self::new(
            rule.error_message_template.clone(),
            rule.success_message_template.clone(),
        )
        .with_settings(settings.clone())
    }

    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// An outcome carrying the template that matches `is_valid`.
    pub fn outcome(&self, is_valid: bool) -> ValidatorOutcome {
        let template = if is_valid {
            &self.success_message_template
        } else {
            &self.error_message_template
        };
        ValidatorOutcome::new(is_valid, template.clone())
    }
}

/// A validator outcome together with the placeholder values for its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidationResult {
    pub rule_id: RuleId,
    pub outcome: ValidatorOutcome,
    /// Navigation-resolved values overlaid with validator-computed ones.
    pub placeholders: BTreeMap<String, String>,
    /// Placeholders that could not be resolved.
    pub resolution_errors: Vec<ResolutionError>,
}

impl FieldValidationResult {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid
    }

    pub fn message_template(&self) -> &str {
        &self.outcome.message_template
    }

    /// Interpolate the outcome's template. Fails if any token is unresolved.
    pub fn render(&self) -> Result<String> {
        interpolate(&self.outcome.message_template, &self.placeholders)
    }
}
