//! Entity metadata registry.
//!
//! The resolution engine never reflects over concrete record types. At each
//! hop of a path it asks the registry which properties the current entity
//! type has, and whether a property is scalar, a single navigation or a
//! collection.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │             EntityMetadataRegistry (trait)            │
//! │  - properties_of(entity_type)                         │
//! │  - exists(entity_type)                                │
//! │  - property(entity_type, name)    (default, derived)  │
//! └───────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌───────────────────────────────────────────────────────┐
//! │   InMemoryMetadataRegistry (schemas held in memory)   │
//! └───────────────────────────────────────────────────────┘
//! ```

mod in_memory;
mod provider;
mod types;

pub use in_memory::InMemoryMetadataRegistry;
pub use provider::EntityMetadataRegistry;
pub use types::{find_property, EntityPropertyDescriptor, EntitySchema};
