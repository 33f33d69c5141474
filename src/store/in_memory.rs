//! In-memory entity store.
//!
//! Holds entities as flat rows with links between them and materialises an
//! [`EntityRecord`] graph on each fetch, loading only the chains named in the
//! prefetch plan. Every fetch is counted so callers can assert round trips.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EntityId, EntityRecord, EntityStore, PrefetchPlan, StoreError, StoreResult};

/// Reference to a stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityKey {
    pub entity_type: String,
    pub id: EntityId,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

/// A stored row: scalar fields plus links to other rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntity {
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub references: BTreeMap<String, EntityKey>,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<EntityKey>>,
}

impl StoredEntity {
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            fields: BTreeMap::new(),
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.entity_type.clone(), self.id.clone())
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Link a single navigation. The target does not have to exist.
    pub fn with_reference(
        mut self,
        name: impl Into<String>,
        entity_type: impl Into<String>,
        id: impl Into<EntityId>,
    ) -> Self {
        self.references
            .insert(name.into(), EntityKey::new(entity_type, id));
        self
    }

    pub fn with_collection<I, K>(
        mut self,
        name: impl Into<String>,
        entity_type: &str,
        ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<EntityId>,
    {
        let keys = ids
            .into_iter()
            .map(|id| EntityKey::new(entity_type, id))
            .collect();
        self.collections.insert(name.into(), keys);
        self
    }
}

/// Number of most recent prefetch plans kept for inspection.
pub const RECORDED_PLAN_LIMIT: usize = 64;

/// Entity store over rows held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: HashMap<EntityKey, StoredEntity>,
    fetches: AtomicUsize,
    plans: Mutex<VecDeque<PrefetchPlan>>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: StoredEntity) -> Self {
        self.insert(entity);
        self
    }

    /// Delay every fetch by `latency` (used to exercise timeouts).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&mut self, entity: StoredEntity) {
        self.entities.insert(entity.key(), entity);
    }

    /// Make every subsequent fetch fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// The last [`RECORDED_PLAN_LIMIT`] prefetch plans received, in call order.
    pub fn recorded_plans(&self) -> Vec<PrefetchPlan> {
        self.plans
            .lock()
            .map(|plans| plans.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn materialize(&self, entity: &StoredEntity, chains: &[Vec<&str>]) -> EntityRecord {
        let mut record = EntityRecord {
            entity_type: entity.entity_type.clone(),
            id: entity.id.clone(),
            fields: entity.fields.clone(),
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
        };

        // Group tails by their first segment so each navigation loads once
        let mut heads: BTreeMap<&str, Vec<Vec<&str>>> = BTreeMap::new();
        for chain in chains {
            if let Some((head, tail)) = chain.split_first() {
                let tails = heads.entry(*head).or_default();
                if !tail.is_empty() {
                    tails.push(tail.to_vec());
                }
            }
        }

        for (head, tails) in heads {
            if let Some(keys) = find_link(&entity.collections, head) {
                let items = keys
                    .iter()
                    .filter_map(|key| self.entities.get(key))
                    .map(|related| self.materialize(related, &tails))
                    .collect();
                record.collections.insert(head.to_string(), items);
            } else {
                let related = find_link(&entity.references, head)
                    .and_then(|key| self.entities.get(key))
                    .map(|related| Box::new(self.materialize(related, &tails)));
                record.references.insert(head.to_string(), related);
            }
        }

        record
    }
}

impl FromIterator<StoredEntity> for InMemoryEntityStore {
    fn from_iter<I: IntoIterator<Item = StoredEntity>>(iter: I) -> Self {
        let mut store = Self::new();
        for entity in iter {
            store.insert(entity);
        }
        store
    }
}

fn find_link<'a, V>(links: &'a BTreeMap<String, V>, name: &str) -> Option<&'a V> {
    links.get(name).or_else(|| {
        links
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn fetch_with_prefetch(
        &self,
        entity_type: &str,
        id: &EntityId,
        plan: &PrefetchPlan,
    ) -> StoreResult<Option<EntityRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut plans) = self.plans.lock() {
            if plans.len() == RECORDED_PLAN_LIMIT {
                plans.pop_front();
            }
            plans.push_back(plan.clone());
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }

        let key = EntityKey::new(entity_type, id.clone());
        let Some(entity) = self.entities.get(&key) else {
            return Ok(None);
        };

        let chains: Vec<Vec<&str>> = plan
            .chains()
            .iter()
            .map(|chain| chain.split('.').collect())
            .collect();

        Ok(Some(self.materialize(entity, &chains)))
    }
}
