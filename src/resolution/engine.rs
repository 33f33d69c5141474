//! Path resolution engine.
//!
//! Resolves a batch of paths rooted at one entity instance with a single
//! store fetch:
//!
//! ```text
//!   paths ──► plan (metadata only) ──► PrefetchPlan ──► one fetch ──► walk record
//!              │                                                         │
//!              └── InvalidPath errors                     values / per-path errors
//! ```
//!
//! Planning checks every segment against the entity metadata before anything
//! is fetched, so schema errors never cost a round trip.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::aggregate::{self, Element};
use super::types::{ResolutionError, ResolutionErrorKind, ResolutionResult};
use crate::config::ResolutionSettings;
use crate::error::{Result, WaymarkError};
use crate::metadata::{find_property, EntityMetadataRegistry, EntityPropertyDescriptor};
use crate::path::{AggregateOperator, PathExpression};
use crate::store::{EntityId, EntityRecord, EntityStore, PrefetchPlan, StoreError, StoreResult};

// ============================================================================
// Planning
// ============================================================================

/// One single-navigation step of a planned path.
#[derive(Debug, Clone)]
struct Hop {
    /// Canonical navigation name from the metadata.
    name: String,
    foreign_key: Option<String>,
    related_type: String,
}

/// What the final segment of a planned path reads.
#[derive(Debug, Clone)]
enum Target {
    Scalar(String),
    Aggregate {
        collection: String,
        of_entities: bool,
        op: AggregateOperator,
    },
}

/// A path checked against the metadata, ready to be walked.
#[derive(Debug, Clone)]
struct PlannedPath {
    path: PathExpression,
    hops: Vec<Hop>,
    target: Target,
}

impl PlannedPath {
    /// Navigation chains the store must load for this path.
    fn chains(&self) -> Vec<String> {
        let mut chains = Vec::with_capacity(self.hops.len() + 1);
        let mut prefix = String::new();
        for hop in &self.hops {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(&hop.name);
            chains.push(prefix.clone());
        }
        if let Target::Aggregate {
            collection,
            of_entities: true,
            ..
        } = &self.target
        {
            if prefix.is_empty() {
                chains.push(collection.clone());
            } else {
                chains.push(format!("{}.{}", prefix, collection));
            }
        }
        chains
    }
}

/// Per-call cache of metadata lookups.
#[derive(Default)]
struct SchemaCache {
    properties: HashMap<String, Vec<EntityPropertyDescriptor>>,
    known: HashMap<String, bool>,
}

impl SchemaCache {
    async fn properties<'c, M: EntityMetadataRegistry + ?Sized>(
        &'c mut self,
        registry: &M,
        entity_type: &str,
    ) -> &'c [EntityPropertyDescriptor] {
        if !self.properties.contains_key(entity_type) {
            let properties = registry.properties_of(entity_type).await;
            self.properties.insert(entity_type.to_string(), properties);
        }
        self.properties
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    async fn exists<M: EntityMetadataRegistry + ?Sized>(
        &mut self,
        registry: &M,
        entity_type: &str,
    ) -> bool {
        if let Some(known) = self.known.get(entity_type) {
            return *known;
        }
        let known = registry.exists(entity_type).await;
        self.known.insert(entity_type.to_string(), known);
        known
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Resolves navigation paths against the entity store.
///
/// # Example
///
/// ```ignore
/// let engine = PathResolutionEngine::new(Arc::new(registry), Arc::new(store));
/// let paths = vec![parse("Town.Name")?, parse("Town.Districts.Count")?];
/// let result = engine.resolve("District", &1.into(), &paths).await?;
/// assert_eq!(result.value("Town.Name"), Some("Springfield"));
/// ```
pub struct PathResolutionEngine<M, S> {
    registry: Arc<M>,
    store: Arc<S>,
    settings: ResolutionSettings,
}

impl<M, S> PathResolutionEngine<M, S>
where
    M: EntityMetadataRegistry,
    S: EntityStore,
{
    pub fn new(registry: Arc<M>, store: Arc<S>) -> Self {
        Self {
            registry,
            store,
            settings: ResolutionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ResolutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &M {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ResolutionSettings {
        &self.settings
    }

    /// Resolve `paths` rooted at `entity_type` #`entity_id`.
    ///
    /// Performs at most one store fetch. Duplicate paths are resolved once.
    /// Fails as a whole only for an unknown root type or an empty batch;
    /// everything else is reported per path.
    #[instrument(skip(self, entity_id, paths), fields(entity_id = %entity_id, paths = paths.len()))]
    pub async fn resolve(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        paths: &[PathExpression],
    ) -> Result<ResolutionResult> {
        if paths.is_empty() {
            return Err(WaymarkError::EmptyRequest);
        }
        if !self.registry.exists(entity_type).await {
            return Err(WaymarkError::UnknownEntityType(entity_type.to_string()));
        }

        let mut result = ResolutionResult::new();
        let mut cache = SchemaCache::default();
        let mut seen = HashSet::new();
        let mut planned = Vec::new();

        for path in paths {
            if !seen.insert(path.full_path()) {
                continue;
            }
            match self.plan(entity_type, path, &mut cache).await {
                Ok(plan) => planned.push(plan),
                Err(error) => {
                    debug!(path = %error.path, detail = %error.detail, "path rejected during planning");
                    result.push_error(error);
                }
            }
        }

        if planned.is_empty() {
            return Ok(result);
        }

        let plan: PrefetchPlan = planned.iter().flat_map(PlannedPath::chains).collect();
        debug!(chains = ?plan.chains(), "fetching root entity");

        match self.fetch(entity_type, entity_id, &plan).await {
            Ok(Some(root)) => {
                for planned_path in &planned {
                    match evaluate(&root, planned_path) {
                        Ok(value) => result.insert_value(planned_path.path.full_path(), value),
                        Err(error) => result.push_error(error),
                    }
                }
            }
            Ok(None) => {
                let detail = format!("{} #{} not found", entity_type, entity_id);
                for planned_path in &planned {
                    result.push_error(ResolutionError::navigation_failed(
                        planned_path.path.full_path(),
                        detail.clone(),
                    ));
                }
            }
            Err(err) => {
                warn!(error = %err, "store fetch failed");
                let detail = format!("store fetch failed: {}", err);
                for planned_path in &planned {
                    result.push_error(ResolutionError::navigation_failed(
                        planned_path.path.full_path(),
                        detail.clone(),
                    ));
                }
            }
        }

        Ok(result)
    }

    async fn fetch(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        plan: &PrefetchPlan,
    ) -> StoreResult<Option<EntityRecord>> {
        let fetch = self.store.fetch_with_prefetch(entity_type, entity_id, plan);
        match self.settings.fetch_timeout_ms {
            0 => fetch.await,
            ms => tokio::time::timeout(Duration::from_millis(ms), fetch)
                .await
                .map_err(|_| StoreError::Timeout(ms))?,
        }
    }

    /// Check `path` against the metadata and record the canonical names of
    /// every navigation it crosses.
    async fn plan(
        &self,
        root_type: &str,
        path: &PathExpression,
        cache: &mut SchemaCache,
    ) -> std::result::Result<PlannedPath, ResolutionError> {
        let full_path = path.full_path();
        let invalid = |detail: String| ResolutionError::invalid_path(full_path, detail);

        if path.depth() == 0 {
            return Err(ResolutionError::dependency_not_filled(
                full_path,
                "direct values are supplied by the caller",
            ));
        }

        let navigation = path.navigation_segments();
        let (walk, collection) = match path.aggregate_operator() {
            Some(_) => navigation.split_at(navigation.len() - 1),
            None => (navigation, &[][..]),
        };

        let mut current_type = root_type.to_string();
        let mut hops = Vec::with_capacity(walk.len());

        for segment in walk {
            let properties = cache.properties(self.registry.as_ref(), &current_type).await;
            let property = find_property(properties, segment).ok_or_else(|| {
                invalid(format!("'{}' is not a property of '{}'", segment, current_type))
            })?;

            if !property.is_navigation {
                return Err(invalid(format!(
                    "'{}.{}' is not a navigation property",
                    current_type, property.name
                )));
            }
            if property.is_collection {
                return Err(invalid(format!(
                    "'{}.{}' is a collection; use an aggregate such as '{}.Count'",
                    current_type, property.name, property.name
                )));
            }

            let related = property.related_entity_type_name.clone().ok_or_else(|| {
                invalid(format!(
                    "'{}.{}' has no related entity type",
                    current_type, property.name
                ))
            })?;
            let hop = Hop {
                name: property.name.clone(),
                foreign_key: property.foreign_key.clone(),
                related_type: related.clone(),
            };

            if !cache.exists(self.registry.as_ref(), &related).await {
                return Err(invalid(format!("unknown entity type '{}'", related)));
            }

            hops.push(hop);
            current_type = related;
        }

        let properties = cache.properties(self.registry.as_ref(), &current_type).await;
        let target = match (path.aggregate_operator(), collection.first()) {
            (Some(op), Some(segment)) => {
                let property = find_property(properties, segment).ok_or_else(|| {
                    invalid(format!("'{}' is not a property of '{}'", segment, current_type))
                })?;
                if !property.is_collection {
                    return Err(invalid(format!(
                        "{} needs a collection but '{}.{}' is a single value",
                        op, current_type, property.name
                    )));
                }
                Target::Aggregate {
                    collection: property.name.clone(),
                    of_entities: property.is_navigation,
                    op,
                }
            }
            _ => {
                let segment = path.final_segment();
                let property = find_property(properties, segment).ok_or_else(|| {
                    invalid(format!("'{}' is not a property of '{}'", segment, current_type))
                })?;
                if property.is_navigation {
                    return Err(invalid(format!(
                        "'{}.{}' is a navigation property, not a value",
                        current_type, property.name
                    )));
                }
                Target::Scalar(property.name.clone())
            }
        };

        Ok(PlannedPath {
            path: path.clone(),
            hops,
            target,
        })
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Walk a fetched record along a planned path.
fn evaluate(root: &EntityRecord, planned: &PlannedPath) -> std::result::Result<String, ResolutionError> {
    let full_path = planned.path.full_path();
    let mut current = root;

    for hop in &planned.hops {
        current = match current.reference(&hop.name) {
            Some(Some(next)) => next,
            Some(None) => return Err(broken_navigation(full_path, current, hop)),
            None => {
                return Err(ResolutionError::navigation_failed(
                    full_path,
                    format!(
                        "navigation '{}' on {} #{} was not loaded",
                        hop.name, current.entity_type, current.id
                    ),
                ));
            }
        };
    }

    match &planned.target {
        Target::Scalar(name) => match current.field(name) {
            Some(value) if !value.is_null() => {
                Ok(crate::value::render_scalar(value).unwrap_or_default())
            }
            _ => Err(ResolutionError::dependency_not_filled(
                full_path,
                format!("'{}' has no value on {} #{}", name, current.entity_type, current.id),
            )),
        },
        Target::Aggregate {
            collection,
            of_entities,
            op,
        } => {
            let elements = collect_elements(current, collection, *of_entities)
                .map_err(|detail| {
                    ResolutionError::new(full_path, ResolutionErrorKind::AggregateTypeMismatch, detail)
                })?;
            aggregate::apply(*op, &elements)
                .map_err(|failure| ResolutionError::new(full_path, failure.kind, failure.detail))
        }
    }
}

/// A null navigation is either an unset foreign key or a dangling one.
fn broken_navigation(path: &str, owner: &EntityRecord, hop: &Hop) -> ResolutionError {
    let foreign_key = hop
        .foreign_key
        .as_deref()
        .and_then(|fk| owner.field(fk).map(|value| (fk, value)))
        .filter(|(_, value)| !value.is_null());

    match foreign_key {
        Some((fk, value)) => ResolutionError::navigation_failed(
            path,
            format!(
                "{} referenced by {}.{} = {} was not found",
                hop.related_type,
                owner.entity_type,
                fk,
                crate::value::render_scalar(value).unwrap_or_default()
            ),
        ),
        None => ResolutionError::dependency_not_filled(
            path,
            format!("'{}' is not set on {} #{}", hop.name, owner.entity_type, owner.id),
        ),
    }
}

/// Elements of a collection in enumeration order; an absent collection is empty.
fn collect_elements<'a>(
    owner: &'a EntityRecord,
    collection: &str,
    of_entities: bool,
) -> std::result::Result<Vec<Element<'a>>, String> {
    if of_entities {
        return Ok(owner
            .collection(collection)
            .map(|items| items.iter().map(Element::Entity).collect())
            .unwrap_or_default());
    }

    match owner.field(collection) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => Ok(items.iter().map(Element::Value).collect()),
        Some(other) => Err(format!(
            "'{}' on {} #{} holds {} instead of a list",
            collection, owner.entity_type, owner.id, other
        )),
    }
}
