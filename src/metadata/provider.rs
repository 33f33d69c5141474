//! EntityMetadataRegistry trait definition.

use async_trait::async_trait;

use super::types::{find_property, EntityPropertyDescriptor};

/// Read-only schema information about entity types.
///
/// Implementations may be backed by an ORM model, a schema file or a remote
/// service. The engine only reads from it and calls it at most once per
/// entity type per resolution.
///
/// # Example
///
/// ```ignore
/// use waymark::metadata::EntityMetadataRegistry;
///
/// async fn is_navigable(registry: &impl EntityMetadataRegistry) -> bool {
///     registry
///         .property("District", "Town")
///         .await
///         .map(|p| p.is_navigation)
///         .unwrap_or(false)
/// }
/// ```
#[async_trait]
pub trait EntityMetadataRegistry: Send + Sync {
    /// All properties of an entity type. Empty for unknown types.
    async fn properties_of(&self, entity_type: &str) -> Vec<EntityPropertyDescriptor>;

    /// Is the entity type known?
    async fn exists(&self, entity_type: &str) -> bool;

    /// Look up a single property by name (case-insensitive fallback).
    async fn property(&self, entity_type: &str, name: &str) -> Option<EntityPropertyDescriptor> {
        let properties = self.properties_of(entity_type).await;
        find_property(&properties, name).cloned()
    }
}
