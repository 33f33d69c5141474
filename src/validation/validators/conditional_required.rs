use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::read_config;
use crate::error::{Result, WaymarkError};
use crate::validation::registry::FieldValidator;
use crate::validation::types::{ValidationContext, ValidatorOutcome};
use crate::value::{json_as_f64, render_scalar, FieldValue};

const VALIDATION_TYPE: &str = "ConditionalRequired";

/// Comparison between the dependency value and the configured literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "equals",
            ComparisonOperator::NotEquals => "notEquals",
            ComparisonOperator::GreaterThan => "greaterThan",
            ComparisonOperator::LessThan => "lessThan",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::In => "in",
        }
    }

    /// Does the comparison hold? An absent dependency equals nothing.
    pub fn holds(&self, actual: Option<&FieldValue>, expected: &Value) -> bool {
        match self {
            ComparisonOperator::Equals => equals(actual, expected),
            ComparisonOperator::NotEquals => !equals(actual, expected),
            ComparisonOperator::GreaterThan => {
                numeric_pair(actual, expected).is_some_and(|(a, b)| a > b)
            }
            ComparisonOperator::LessThan => {
                numeric_pair(actual, expected).is_some_and(|(a, b)| a < b)
            }
            ComparisonOperator::Contains => contains(actual, expected),
            ComparisonOperator::In => expected_items(expected)
                .iter()
                .any(|item| equals(actual, item)),
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    /// Operator names are matched ignoring ASCII case (`notEquals`, `NotEquals`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        const ALL: [ComparisonOperator; 6] = [
            ComparisonOperator::Equals,
            ComparisonOperator::NotEquals,
            ComparisonOperator::GreaterThan,
            ComparisonOperator::LessThan,
            ComparisonOperator::Contains,
            ComparisonOperator::In,
        ];
        ALL.into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown operator '{}'", s))
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Config {
    #[serde(default = "default_operator")]
    operator: String,
    #[serde(default)]
    value: Value,
    /// Path on the dependency value to compare; the whole value when unset.
    #[serde(default)]
    dependency_path: Option<String>,
    /// Overrides `ValidationSettings::zero_is_empty` for this rule.
    #[serde(default)]
    zero_is_empty: Option<bool>,
}

fn default_operator() -> String {
    "equals".to_string()
}

/// The field is required only while the dependency satisfies a comparison.
///
/// Computed placeholders: `dependencyValue`, `expectedValue`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalRequired;

#[async_trait]
impl FieldValidator for ConditionalRequired {
    fn validation_type(&self) -> &str {
        VALIDATION_TYPE
    }

    async fn validate(
        &self,
        field: Option<&FieldValue>,
        dependency: Option<&FieldValue>,
        configuration: &Value,
        ctx: &ValidationContext,
    ) -> Result<ValidatorOutcome> {
        let config: Config = read_config(VALIDATION_TYPE, configuration)?;
        let operator: ComparisonOperator = config
            .operator
            .parse()
            .map_err(|message| WaymarkError::invalid_configuration(VALIDATION_TYPE, message))?;

        let actual = dependency
            .and_then(|value| match config.dependency_path.as_deref() {
                Some(path) => value.get_path(path),
                None => Some(value.clone()),
            })
            .filter(|value| !value.is_null());

        let dependency_text = actual.as_ref().and_then(FieldValue::as_text).unwrap_or_default();
        let expected_text = expected_items(&config.value)
            .iter()
            .filter_map(render_scalar)
            .collect::<Vec<_>>()
            .join(", ");

        let outcome = if operator.holds(actual.as_ref(), &config.value) {
            let zero_is_empty = config.zero_is_empty.unwrap_or(ctx.settings.zero_is_empty);
            let empty = field.map_or(true, |value| value.is_empty(zero_is_empty));
            let outcome = ctx.outcome(!empty);
            if empty {
                outcome.with_metadata("failure", "required")
            } else {
                outcome
            }
        } else {
            ctx.outcome(true).with_metadata("condition", "notMet")
        };

        Ok(outcome
            .with_placeholder("dependencyValue", dependency_text)
            .with_placeholder("expectedValue", expected_text))
    }
}

fn text_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn equals(actual: Option<&FieldValue>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return expected.is_null();
    };
    if let (Some(a), Some(b)) = (actual.as_f64(), json_as_f64(expected)) {
        return a == b;
    }
    match (actual.as_text(), render_scalar(expected)) {
        (Some(a), Some(b)) => text_eq(&a, &b),
        _ => false,
    }
}

fn numeric_pair(actual: Option<&FieldValue>, expected: &Value) -> Option<(f64, f64)> {
    Some((actual?.as_f64()?, json_as_f64(expected)?))
}

fn contains(actual: Option<&FieldValue>, expected: &Value) -> bool {
    let (Some(actual), Some(needle)) = (actual, render_scalar(expected)) else {
        return false;
    };
    match actual {
        FieldValue::Tree(Value::Array(items)) => items
            .iter()
            .filter_map(render_scalar)
            .any(|item| text_eq(&item, &needle)),
        other => other
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(&needle.trim().to_lowercase())),
    }
}

/// The configured literal as a list: arrays as-is, strings split on commas.
fn expected_items(expected: &Value) -> Vec<Value> {
    match expected {
        Value::Array(items) => items.clone(),
        Value::String(s) if s.contains(',') => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}
