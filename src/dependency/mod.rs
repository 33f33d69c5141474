//! Field dependency graph and cycle detection.
//!
//! Validation rules may make one field depend on another. Before a new edge
//! is persisted, the detector checks that it would not close a loop:
//!
//! ```text
//!   proposed: A ──► B
//!   existing: B ──► C ──► A        ⇒  A ──► B ──► C ──► A  (rejected)
//! ```
//!
//! The graph is rebuilt from the edge source on every call; nothing is cached
//! between checks.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{Result, WaymarkError};
use crate::store::StoreError;

/// Identifier of a form field.
pub type FieldId = i64;

/// A persisted "field depends on field" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub field_id: FieldId,
    pub depends_on_field_id: FieldId,
}

impl DependencyEdge {
    pub fn new(field_id: FieldId, depends_on_field_id: FieldId) -> Self {
        Self {
            field_id,
            depends_on_field_id,
        }
    }
}

/// Source of the existing dependency edges.
#[async_trait]
pub trait DependencyEdgeSource: Send + Sync {
    async fn dependency_edges(&self) -> std::result::Result<Vec<DependencyEdge>, StoreError>;
}

#[async_trait]
impl DependencyEdgeSource for Vec<DependencyEdge> {
    async fn dependency_edges(&self) -> std::result::Result<Vec<DependencyEdge>, StoreError> {
        Ok(self.clone())
    }
}

/// Detects whether a proposed dependency edge would create a cycle.
pub struct CycleDetector<E> {
    edges: E,
}

impl<E: DependencyEdgeSource> CycleDetector<E> {
    pub fn new(edges: E) -> Self {
        Self { edges }
    }

    pub fn source(&self) -> &E {
        &self.edges
    }

    /// Would adding `field_id -> depends_on` close a loop?
    ///
    /// A field depending on itself is a cycle.
    pub async fn would_create_cycle(&self, field_id: FieldId, depends_on: FieldId) -> Result<bool> {
        Ok(self.find_cycle(field_id, depends_on).await?.is_some())
    }

    /// Like [`would_create_cycle`](Self::would_create_cycle), but reports the
    /// loop as an error.
    pub async fn ensure_acyclic(&self, field_id: FieldId, depends_on: FieldId) -> Result<()> {
        match self.find_cycle(field_id, depends_on).await? {
            Some(chain) => {
                warn!(field_id, depends_on, ?chain, "rejected circular dependency");
                Err(WaymarkError::CircularDependency {
                    field_id,
                    depends_on,
                    chain,
                })
            }
            None => Ok(()),
        }
    }

    /// The loop the proposed edge would close, from `field_id` back to itself.
    #[instrument(skip(self))]
    pub async fn find_cycle(&self, field_id: FieldId, depends_on: FieldId) -> Result<Option<Vec<FieldId>>> {
        if field_id == depends_on {
            return Ok(Some(vec![field_id, field_id]));
        }

        let edges = self.edges.dependency_edges().await?;
        let graph = build_graph(&edges);
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "dependency graph built");

        Ok(shortest_path(&graph, depends_on, field_id).map(|path| {
            let mut chain = Vec::with_capacity(path.len() + 1);
            chain.push(field_id);
            chain.extend(path);
            chain
        }))
    }
}

fn build_graph(edges: &[DependencyEdge]) -> DiGraphMap<FieldId, ()> {
    let mut graph = DiGraphMap::new();
    for edge in edges {
        graph.add_edge(edge.field_id, edge.depends_on_field_id, ());
    }
    graph
}

/// BFS from `from` to `to` over dependency edges.
///
/// Uses parent pointers and walks them back once the target is reached.
fn shortest_path(graph: &DiGraphMap<FieldId, ()>, from: FieldId, to: FieldId) -> Option<Vec<FieldId>> {
    if !graph.contains_node(from) || !graph.contains_node(to) {
        return None;
    }

    let mut parents: HashMap<FieldId, FieldId> = HashMap::new();
    let mut queue: VecDeque<FieldId> = VecDeque::new();
    queue.push_back(from);
    parents.insert(from, from);

    while let Some(current) = queue.pop_front() {
        if current == to {
            return Some(reconstruct(from, to, &parents));
        }
        for next in graph.neighbors(current) {
            if !parents.contains_key(&next) {
                parents.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

fn reconstruct(from: FieldId, to: FieldId, parents: &HashMap<FieldId, FieldId>) -> Vec<FieldId> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = parents[&current];
        path.push(current);
    }
    path.reverse();
    path
}
