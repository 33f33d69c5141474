//! Abstract entity store.
//!
//! The store is the only data source the engine reads from. A fetch names a
//! root entity and the navigation chains to load eagerly in the same round
//! trip, so a whole placeholder set costs one call per root entity.

mod in_memory;
mod record;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use in_memory::{EntityKey, InMemoryEntityStore, StoredEntity, RECORDED_PLAN_LIMIT};
pub use record::EntityRecord;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a store implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The fetch did not complete in time.
    #[error("store request timed out after {0} ms")]
    Timeout(u64),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Opaque entity identifier.
///
/// Accepts integer and string keys when deserialising; both are kept in their
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawEntityId", into = "String")]
pub struct EntityId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntityId {
    Int(i64),
    Text(String),
}

impl From<RawEntityId> for EntityId {
    fn from(raw: RawEntityId) -> Self {
        match raw {
            RawEntityId::Int(n) => EntityId(n.to_string()),
            RawEntityId::Text(s) => EntityId(s),
        }
    }
}

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

macro_rules! entity_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for EntityId {
                fn from(id: $t) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

entity_id_from_int!(i32, i64, u32, u64);

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Navigation chains to load together with a root entity.
///
/// Chains are dot-joined property names relative to the root. Insertion order
/// is kept and duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchPlan {
    chains: Vec<String>,
}

impl PrefetchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chain. Returns false if it was already present.
    pub fn add(&mut self, chain: impl Into<String>) -> bool {
        let chain = chain.into();
        if self.chains.contains(&chain) {
            return false;
        }
        self.chains.push(chain);
        true
    }

    pub fn chains(&self) -> &[String] {
        &self.chains
    }

    pub fn contains(&self, chain: &str) -> bool {
        self.chains.iter().any(|c| c == chain)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PrefetchPlan {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut plan = Self::new();
        for chain in iter {
            plan.add(chain);
        }
        plan
    }
}

/// Source of entity records.
///
/// # Example
///
/// ```ignore
/// use waymark::store::{EntityStore, PrefetchPlan};
///
/// let plan: PrefetchPlan = ["Town", "Town.Districts"].into_iter().collect();
/// let district = store.fetch_with_prefetch("District", &1.into(), &plan).await?;
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one entity with every chain of `plan` loaded.
    ///
    /// Returns `Ok(None)` when the root entity does not exist.
    async fn fetch_with_prefetch(
        &self,
        entity_type: &str,
        id: &EntityId,
        plan: &PrefetchPlan,
    ) -> StoreResult<Option<EntityRecord>>;
}
