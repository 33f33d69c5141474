//! Dependency cycle detection.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use proptest::prelude::*;
use waymark::dependency::{CycleDetector, DependencyEdge, DependencyEdgeSource, FieldId};
use waymark::store::StoreError;
use waymark::WaymarkError;

fn edges(pairs: &[(FieldId, FieldId)]) -> Vec<DependencyEdge> {
    pairs.iter().map(|&(a, b)| DependencyEdge::new(a, b)).collect()
}

#[tokio::test]
async fn test_empty_graph_has_no_cycles() {
    let detector = CycleDetector::new(Vec::new());
    assert!(!detector.would_create_cycle(1, 2).await.unwrap());
    assert!(detector.ensure_acyclic(1, 2).await.is_ok());
}

#[tokio::test]
async fn test_direct_back_edge() {
    // 2 already depends on 1
    let detector = CycleDetector::new(edges(&[(2, 1)]));
    assert!(detector.would_create_cycle(1, 2).await.unwrap());
    assert!(!detector.would_create_cycle(3, 2).await.unwrap());
}

#[tokio::test]
async fn test_transitive_cycle() {
    let detector = CycleDetector::new(edges(&[(2, 3), (3, 4), (4, 1), (5, 1)]));
    assert!(detector.would_create_cycle(1, 2).await.unwrap());
    assert!(detector.would_create_cycle(1, 4).await.unwrap());
    assert!(!detector.would_create_cycle(1, 5).await.unwrap());
    // Same direction as the existing chain
    assert!(!detector.would_create_cycle(2, 4).await.unwrap());
}

#[tokio::test]
async fn test_existing_unrelated_cycle_terminates() {
    let detector = CycleDetector::new(edges(&[(10, 11), (11, 12), (12, 10), (2, 10)]));
    assert!(!detector.would_create_cycle(1, 2).await.unwrap());
    assert!(!detector.would_create_cycle(2, 12).await.unwrap());
    assert!(detector.would_create_cycle(10, 12).await.unwrap());
}

#[tokio::test]
async fn test_ensure_acyclic_reports_chain() {
    let detector = CycleDetector::new(edges(&[(2, 3), (3, 1)]));
    let err = detector.ensure_acyclic(1, 2).await.unwrap_err();

    match &err {
        WaymarkError::CircularDependency {
            field_id,
            depends_on,
            chain,
        } => {
            assert_eq!((*field_id, *depends_on), (1, 2));
            assert_eq!(chain, &[1, 2, 3, 1]);
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
    insta::assert_snapshot!(err.to_string(), @"circular dependency: field 1 cannot depend on field 2 (1 -> 2 -> 3 -> 1)");
}

#[tokio::test]
async fn test_self_dependency_is_a_cycle() {
    let detector = CycleDetector::new(Vec::new());
    assert_eq!(detector.find_cycle(4, 4).await.unwrap(), Some(vec![4, 4]));
}

struct CountingSource {
    edges: Vec<DependencyEdge>,
    calls: AtomicUsize,
}

#[async_trait]
impl DependencyEdgeSource for CountingSource {
    async fn dependency_edges(&self) -> Result<Vec<DependencyEdge>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.edges.clone())
    }
}

#[tokio::test]
async fn test_edges_are_reread_on_every_check() {
    let detector = CycleDetector::new(CountingSource {
        edges: edges(&[(2, 1)]),
        calls: AtomicUsize::new(0),
    });

    detector.would_create_cycle(1, 2).await.unwrap();
    detector.would_create_cycle(3, 4).await.unwrap();
    assert_eq!(detector.source().calls.load(Ordering::SeqCst), 2);
}

struct FailingSource;

#[async_trait]
impl DependencyEdgeSource for FailingSource {
    async fn dependency_edges(&self) -> Result<Vec<DependencyEdge>, StoreError> {
        Err(StoreError::Backend("edge table locked".to_string()))
    }
}

#[tokio::test]
async fn test_source_failure_propagates() {
    let detector = CycleDetector::new(FailingSource);
    let err = detector.would_create_cycle(1, 2).await.unwrap_err();
    assert!(matches!(err, WaymarkError::Store(StoreError::Backend(_))));
}

/// Is `to` reachable from `from` following edges?
fn reachable(pairs: &[(FieldId, FieldId)], from: FieldId, to: FieldId) -> bool {
    let mut seen = BTreeSet::from([from]);
    let mut frontier = vec![from];
    while let Some(node) = frontier.pop() {
        if node == to {
            return true;
        }
        for &(a, b) in pairs {
            if a == node && seen.insert(b) {
                frontier.push(b);
            }
        }
    }
    false
}

proptest! {
    #[test]
    fn prop_cycle_iff_reverse_path_exists(
        pairs in prop::collection::vec((0i64..8, 0i64..8), 0..20),
        field in 0i64..8,
        depends_on in 0i64..8,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let detector = CycleDetector::new(edges(&pairs));

        let found = runtime.block_on(detector.find_cycle(field, depends_on)).unwrap();
        let expected = field == depends_on || reachable(&pairs, depends_on, field);
        prop_assert_eq!(found.is_some(), expected);

        if let Some(chain) = found {
            prop_assert_eq!(chain.first(), Some(&field));
            prop_assert_eq!(chain.last(), Some(&field));
            prop_assert_eq!(chain.get(1), Some(&depends_on));
        }
    }
}
