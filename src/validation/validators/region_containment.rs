use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{dependency_missing, present, read_config, text_at};
use crate::error::Result;
use crate::validation::registry::FieldValidator;
use crate::validation::spatial::SpatialContainment;
use crate::validation::types::{ValidationContext, ValidatorOutcome};
use crate::value::FieldValue;

const VALIDATION_TYPE: &str = "RegionContainment";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Config {
    /// Path on the field value yielding the child region identifier.
    child_region_path: String,
    /// Path on the dependency value yielding the parent region identifier.
    parent_region_path: String,
    require_full: Option<bool>,
    parent_name_path: Option<String>,
    child_name_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            child_region_path: "RegionId".to_string(),
            parent_region_path: "RegionId".to_string(),
            require_full: None,
            parent_name_path: None,
            child_name_path: None,
        }
    }
}

/// The region named by the field value must lie inside the region named by
/// the dependency value.
///
/// Computed placeholders: `childRegion`, `parentRegion` (identifiers) and
/// `childName`, `parentName` (display names, falling back to identifiers).
pub struct RegionContainment {
    spatial: Arc<dyn SpatialContainment>,
}

impl RegionContainment {
    pub fn new(spatial: Arc<dyn SpatialContainment>) -> Self {
        Self { spatial }
    }
}

#[async_trait]
impl FieldValidator for RegionContainment {
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

        let Some(field) = present(field) else {
            return Ok(dependency_missing(ctx, "field"));
        };
        let Some(dependency) = present(dependency) else {
            return Ok(dependency_missing(ctx, "dependency"));
        };
        let Some(child) = text_at(field, &config.child_region_path) else {
            return Ok(dependency_missing(ctx, "childRegion"));
        };
        let Some(parent) = text_at(dependency, &config.parent_region_path) else {
            return Ok(dependency_missing(ctx, "parentRegion"));
        };

        let child_name = config
            .child_name_path
            .as_deref()
            .and_then(|path| text_at(field, path))
            .unwrap_or_else(|| child.clone());
        let parent_name = config
            .parent_name_path
            .as_deref()
            .and_then(|path| text_at(dependency, path))
            .unwrap_or_else(|| parent.clone());
        let require_full = config
            .require_full
            .unwrap_or(ctx.settings.require_full_containment);

        let outcome = match self
            .spatial
            .region_contained(&parent, &child, require_full)
            .await
        {
            Ok(contained) => ctx.outcome(contained),
            Err(err) => {
                warn!(parent = %parent, child = %child, error = %err, "region containment check failed");
                ctx.outcome(false)
                    .with_metadata("failure", "spatialError")
                    .with_metadata("error", err.to_string())
            }
        };

        Ok(outcome
            .with_placeholder("childRegion", child)
            .with_placeholder("parentRegion", parent)
            .with_placeholder("childName", child_name)
            .with_placeholder("parentName", parent_name))
    }
}
