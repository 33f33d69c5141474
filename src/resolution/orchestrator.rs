//! Placeholder orchestration.
//!
//! Turns raw placeholder text into resolved values: parses every path,
//! answers Layer 0 paths from caller-supplied values, and hands the rest to
//! the [`PathResolutionEngine`] as one batch.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::engine::PathResolutionEngine;
use super::template::extract_placeholders;
use super::types::{KnownValues, ResolutionError, ResolutionRequest, ResolutionResult};
use crate::config::ResolutionSettings;
use crate::error::{Result, WaymarkError};
use crate::metadata::EntityMetadataRegistry;
use crate::path::{parse_with_max_depth, PathExpression};
use crate::store::{EntityId, EntityStore};

/// Entry point for resolving placeholder paths.
pub struct PlaceholderResolver<M, S> {
    engine: PathResolutionEngine<M, S>,
}

impl<M, S> PlaceholderResolver<M, S>
where
    M: EntityMetadataRegistry,
    S: EntityStore,
{
    pub fn new(registry: Arc<M>, store: Arc<S>) -> Self {
        Self::from_engine(PathResolutionEngine::new(registry, store))
    }

    pub fn from_engine(engine: PathResolutionEngine<M, S>) -> Self {
        Self { engine }
    }

    pub fn with_settings(self, settings: ResolutionSettings) -> Self {
        Self::from_engine(self.engine.with_settings(settings))
    }

    pub fn engine(&self) -> &PathResolutionEngine<M, S> {
        &self.engine
    }

    /// Distinct placeholder paths in `template`, in order of first appearance.
    pub fn extract_placeholders(&self, template: &str) -> Vec<String> {
        extract_placeholders(template)
    }

    /// Resolve every path of `request`.
    ///
    /// Paths are keyed by their parsed full path (or the trimmed raw text when
    /// parsing fails) and each key appears once. Paths that fail to parse are
    /// reported as `InvalidPath`; Layer 0 paths come from `known_values`.
    #[instrument(
        skip(self, request),
        fields(entity_type = %request.entity_type_name, entity_id = %request.entity_id)
    )]
    pub async fn resolve_all(&self, request: &ResolutionRequest) -> Result<ResolutionResult> {
        if request.paths.is_empty() {
            return Err(WaymarkError::EmptyRequest);
        }
        if !self.engine.registry().exists(&request.entity_type_name).await {
            return Err(WaymarkError::UnknownEntityType(
                request.entity_type_name.clone(),
            ));
        }

        let max_depth = self.engine.settings().max_depth;
        let mut result = ResolutionResult::new();
        let mut seen = HashSet::new();
        let mut navigable: Vec<PathExpression> = Vec::new();

        for raw in &request.paths {
            let path = match parse_with_max_depth(raw, max_depth) {
                Ok(path) => path,
                Err(err) => {
                    let key = raw.trim().to_string();
                    if seen.insert(key.clone()) {
                        let detail = match err {
                            WaymarkError::MalformedPath { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        result.push_error(ResolutionError::invalid_path(key, detail));
                    }
                    continue;
                }
            };

            if !seen.insert(path.full_path().to_string()) {
                continue;
            }

            if path.depth() == 0 {
                match known_value(&request.known_values, path.full_path()) {
                    Some(value) => result.insert_value(path.full_path(), value),
                    None => result.push_error(ResolutionError::dependency_not_filled(
                        path.full_path(),
                        "no value supplied for direct property",
                    )),
                }
            } else {
                navigable.push(path);
            }
        }

        if !navigable.is_empty() {
            let resolved = self
                .engine
                .resolve(&request.entity_type_name, &request.entity_id, &navigable)
                .await?;
            result.merge(resolved);
        }

        debug!(
            resolved = result.values.len(),
            failed = result.errors.len(),
            "placeholder resolution finished"
        );
        Ok(result)
    }

    /// Extract the placeholders of `template` and resolve them.
    ///
    /// A template without placeholders yields an empty result.
    pub async fn resolve_template(
        &self,
        entity_type: &str,
        entity_id: impl Into<EntityId>,
        template: &str,
        known_values: &KnownValues,
    ) -> Result<ResolutionResult> {
        let paths = extract_placeholders(template);
        if paths.is_empty() {
            return Ok(ResolutionResult::new());
        }
        let request = ResolutionRequest::new(entity_type, entity_id)
            .with_paths(paths)
            .with_known_values(known_values.clone());
        self.resolve_all(&request).await
    }
}

/// Caller-supplied value for a direct property, matched exactly first and
/// then ignoring case. Keys may carry their braces.
fn known_value(known: &KnownValues, name: &str) -> Option<String> {
    let bare = |key: &str| key.trim().trim_start_matches('{').trim_end_matches('}').trim().to_string();
    known
        .iter()
        .find(|(key, _)| bare(key) == name)
        .or_else(|| known.iter().find(|(key, _)| bare(key).eq_ignore_ascii_case(name)))
        .map(|(_, value)| value.clone())
}
