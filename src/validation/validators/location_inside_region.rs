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
use crate::value::{format_number, FieldValue};

const VALIDATION_TYPE: &str = "LocationInsideRegion";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Config {
    /// Path on the dependency value yielding the region identifier.
    region_path: String,
    allow_boundary: Option<bool>,
    /// Path on the dependency value yielding a display name for the region.
    region_name_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region_path: "RegionId".to_string(),
            allow_boundary: None,
            region_name_path: None,
        }
    }
}

/// The field value is a coordinate that must lie inside the region named by
/// the dependency value.
///
/// Computed placeholders: `coordinates` (`"x, z"`), `regionId`, `regionName`.
pub struct LocationInsideRegion {
    spatial: Arc<dyn SpatialContainment>,
}

impl LocationInsideRegion {
    pub fn new(spatial: Arc<dyn SpatialContainment>) -> Self {
        Self { spatial }
    }
}

#[async_trait]
impl FieldValidator for LocationInsideRegion {
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
        let Some(region_id) = text_at(dependency, &config.region_path) else {
            return Ok(dependency_missing(ctx, "region"));
        };
        let region_name = config
            .region_name_path
            .as_deref()
            .and_then(|path| text_at(dependency, path))
            .unwrap_or_else(|| region_id.clone());

        let Some((x, z)) = field.as_coordinates() else {
            return Ok(ctx
                .outcome(false)
                .with_placeholder("regionId", region_id)
                .with_placeholder("regionName", region_name)
                .with_metadata("failure", "invalidCoordinates"));
        };
        let coordinates = format!("{}, {}", format_number(x), format_number(z));
        let allow_boundary = config
            .allow_boundary
            .unwrap_or(ctx.settings.allow_boundary);

        let outcome = match self
            .spatial
            .point_in_region(&region_id, x, z, allow_boundary)
            .await
        {
            Ok(inside) => ctx.outcome(inside),
            Err(err) => {
                warn!(region = %region_id, error = %err, "point-in-region check failed");
                ctx.outcome(false)
                    .with_metadata("failure", "spatialError")
                    .with_metadata("error", err.to_string())
            }
        };

        Ok(outcome
            .with_placeholder("coordinates", coordinates)
            .with_placeholder("regionId", region_id)
            .with_placeholder("regionName", region_name))
    }
}
