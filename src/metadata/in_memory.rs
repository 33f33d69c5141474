//! In-memory metadata registry.

use std::collections::HashMap;

use async_trait::async_trait;

use super::provider::EntityMetadataRegistry;
use super::types::{EntityPropertyDescriptor, EntitySchema};

/// Metadata registry over schemas held in memory.
///
/// Entity type names are matched exactly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataRegistry {
    schemas: HashMap<String, EntitySchema>,
}

impl InMemoryMetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entity schema.
    pub fn with_entity(mut self, schema: EntitySchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn schema(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<EntitySchema> for InMemoryMetadataRegistry {
    fn from_iter<I: IntoIterator<Item = EntitySchema>>(iter: I) -> Self {
        let mut registry = Self::new();
        for schema in iter {
            registry.insert(schema);
        }
        registry
    }
}

#[async_trait]
impl EntityMetadataRegistry for InMemoryMetadataRegistry {
    async fn properties_of(&self, entity_type: &str) -> Vec<EntityPropertyDescriptor> {
        self.schemas
            .get(entity_type)
            .map(|schema| schema.properties.clone())
            .unwrap_or_default()
    }

    async fn exists(&self, entity_type: &str) -> bool {
        self.schemas.contains_key(entity_type)
    }
}
