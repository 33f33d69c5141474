//! Metadata types describing entity properties.

use serde::{Deserialize, Serialize};

/// Describes one property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPropertyDescriptor {
    pub name: String,

    /// Declared type name (e.g. `int`, `string`, `Town`).
    pub declared_type: String,

    /// Points at another entity (single or collection).
    #[serde(default)]
    pub is_navigation: bool,

    /// Holds many values or many related entities.
    #[serde(default)]
    pub is_collection: bool,

    /// Target entity type for navigation properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type_name: Option<String>,

    /// Scalar property on the owning entity that holds the foreign key of a
    /// single navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

impl EntityPropertyDescriptor {
    /// A plain scalar property.
    pub fn scalar(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_navigation: false,
            is_collection: false,
            related_entity_type_name: None,
            foreign_key: None,
        }
    }

    /// A collection of scalar values (e.g. a list of tags).
    pub fn scalar_collection(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            is_collection: true,
            ..Self::scalar(name, element_type)
        }
    }

    /// A single navigation to another entity.
    pub fn reference(
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: Option<&str>,
    ) -> Self {
        let related = related.into();
        Self {
            name: name.into(),
            declared_type: related.clone(),
            is_navigation: true,
            is_collection: false,
            related_entity_type_name: Some(related),
            foreign_key: foreign_key.map(str::to_string),
        }
    }

    /// A collection navigation to many entities.
    pub fn collection(name: impl Into<String>, related: impl Into<String>) -> Self {
        let related = related.into();
        Self {
            name: name.into(),
            declared_type: format!("{}[]", related),
            is_navigation: true,
            is_collection: true,
            related_entity_type_name: Some(related),
            foreign_key: None,
        }
    }

    /// Is this a single (non-collection) navigation?
    pub fn is_reference(&self) -> bool {
        self.is_navigation && !self.is_collection
    }
}

/// All properties of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<EntityPropertyDescriptor>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: EntityPropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_scalar(self, name: &str, declared_type: &str) -> Self {
        self.with_property(EntityPropertyDescriptor::scalar(name, declared_type))
    }

    pub fn with_reference(self, name: &str, related: &str, foreign_key: Option<&str>) -> Self {
        self.with_property(EntityPropertyDescriptor::reference(name, related, foreign_key))
    }

    pub fn with_collection(self, name: &str, related: &str) -> Self {
        self.with_property(EntityPropertyDescriptor::collection(name, related))
    }

    pub fn property(&self, name: &str) -> Option<&EntityPropertyDescriptor> {
        find_property(&self.properties, name)
    }
}

/// Look up a property by name: exact match first, then ASCII case-insensitive.
pub fn find_property<'a>(
    properties: &'a [EntityPropertyDescriptor],
    name: &str,
) -> Option<&'a EntityPropertyDescriptor> {
    properties
        .iter()
        .find(|p| p.name == name)
        .or_else(|| properties.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
}
