//! Entity records returned by a store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntityId;

/// An entity with its scalar fields and whatever navigations were loaded.
///
/// A navigation that was not part of the prefetch plan is absent from
/// `references`/`collections`. A single navigation that was requested but
/// has no related entity is present as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, Option<Box<EntityRecord>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, Vec<EntityRecord>>,
}

impl EntityRecord {
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            fields: BTreeMap::new(),
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_reference(mut self, name: impl Into<String>, related: Option<EntityRecord>) -> Self {
        self.references.insert(name.into(), related.map(Box::new));
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>, items: Vec<EntityRecord>) -> Self {
        self.collections.insert(name.into(), items);
        self
    }

    /// Scalar field by name (case-insensitive fallback).
    pub fn field(&self, name: &str) -> Option<&Value> {
        lookup(&self.fields, name)
    }

    /// Loaded single navigation.
    ///
    /// `None` if the navigation was not loaded, `Some(None)` if it was loaded
    /// and is empty.
    pub fn reference(&self, name: &str) -> Option<Option<&EntityRecord>> {
        lookup(&self.references, name).map(|r| r.as_deref())
    }

    /// Loaded collection navigation.
    pub fn collection(&self, name: &str) -> Option<&[EntityRecord]> {
        lookup(&self.collections, name).map(Vec::as_slice)
    }
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, name: &str) -> Option<&'a V> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}
