mod common;

use std::sync::Arc;

use serde_json::json;

use common::{MockCatalog, test_config, wave_graph};
use francolino::model::{EdgeSpec, NodePatch};
use francolino::store::{GraphStore, StoreError};
use francolino::types::{NodeType, Position};

fn store_with(catalog: MockCatalog) -> GraphStore {
    GraphStore::new(Arc::new(catalog), &test_config())
}

fn empty_store() -> GraphStore {
    store_with(MockCatalog::default())
}

#[tokio::test]
async fn add_node_fetches_template_and_classifies() {
    let mut store = store_with(
        MockCatalog::default().with_action("Wave", json!({"name": "Wave", "duration": 3})),
    );

    let start_id = store.add_node(NodePatch::new(), Some("Init")).await;
    let wave_id = store.add_node(NodePatch::new(), Some("Wave")).await;

    let doc = store.snapshot();
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.node(&start_id).unwrap().node_type, NodeType::Start);
    let wave = doc.node(&wave_id).unwrap();
    assert_eq!(wave.node_type, NodeType::Action);
    assert_eq!(wave.label, "Wave");
    assert_eq!(wave.data["duration"], json!(3));
}

#[tokio::test]
async fn template_fetch_failure_degrades_to_empty_data() {
    let mut store = store_with(MockCatalog::default().unreachable());
    let id = store.add_node(NodePatch::new(), Some("Wave")).await;
    let doc = store.snapshot();
    assert_eq!(doc.node(&id).unwrap().data, json!({}));
}

#[tokio::test]
async fn duplicate_labels_get_numeric_suffixes() {
    let mut store = empty_store();
    store
        .add_node(NodePatch::new().with_label("Wave"), Some("Wave"))
        .await;
    store
        .add_node(NodePatch::new().with_label("Wave"), Some("Wave"))
        .await;
    store
        .add_node(NodePatch::new().with_label("Wave"), Some("Wave"))
        .await;

    let labels: Vec<String> = store.snapshot().nodes.iter().map(|n| n.label.clone()).collect();
    assert_eq!(labels, vec!["Wave", "Wave1", "Wave2"]);
}

#[tokio::test]
async fn update_node_applies_patch_and_ignores_unknown_id() {
    let mut store = empty_store();
    let id = store.add_node(NodePatch::new().with_label("Wave"), Some("Wave")).await;

    let before = store.snapshot();
    store.update_node("no-such-node", NodePatch::new().with_label("Ghost"));
    assert_eq!(store.snapshot(), before);

    store.update_node(
        &id,
        NodePatch::new()
            .with_color("#ff0000")
            .with_position(Position::new(42.0, 7.0)),
    );
    let node = store.snapshot().node(&id).cloned().unwrap();
    assert_eq!(node.color, "#ff0000");
    assert_eq!(node.position, Position::new(42.0, 7.0));
    assert_eq!(node.label, "Wave");
}

#[tokio::test]
async fn add_edge_validates_endpoints() {
    let mut store = empty_store();
    let a = store.add_node(NodePatch::new().with_label("A"), Some("A")).await;
    let b = store.add_node(NodePatch::new().with_label("B"), Some("B")).await;

    let edge_id = store.add_edge(EdgeSpec::new(&a, &b)).unwrap();
    assert!(store.snapshot().edges.iter().any(|e| e.id == edge_id));

    assert!(matches!(
        store.add_edge(EdgeSpec::new("", &b)),
        Err(StoreError::MissingEndpoint)
    ));
    assert!(matches!(
        store.add_edge(EdgeSpec::new(&a, "no-such-node")),
        Err(StoreError::UnknownEndpoint { .. })
    ));
    let err = store.add_edge(EdgeSpec::new(&a, &b)).unwrap_err();
    assert_eq!(err.to_string(), format!("duplicate edge from '{a}' to '{b}'"));
    assert!(matches!(
        err,
        StoreError::DuplicateEdge { ref from, ref to } if from == &a && to == &b
    ));
    assert_eq!(store.snapshot().edges.len(), 1);
}

#[test]
fn remove_elements_cascades_to_touching_edges() {
    let mut store = empty_store();
    store.load(wave_graph());

    store.remove_elements(&["n-wave".to_string()]);

    let doc = store.snapshot();
    assert_eq!(doc.nodes.len(), 2);
    assert!(doc.node("n-wave").is_none());
    // Both edges touched the removed node.
    assert!(doc.edges.is_empty());
}

#[test]
fn remove_elements_keeps_unrelated_edges() {
    let mut store = empty_store();
    store.load(wave_graph());

    store.remove_elements(&["n-end".to_string()]);

    let doc = store.snapshot();
    assert_eq!(doc.edges.len(), 1);
    assert_eq!(doc.edges[0].id, "e-1");
}

#[tokio::test]
async fn undo_restores_previous_snapshot_and_redo_replays() {
    let mut store = empty_store();
    store.load(wave_graph());
    let loaded = store.snapshot();

    store.remove_elements(&["n-wave".to_string()]);
    let removed = store.snapshot();
    assert_ne!(loaded, removed);

    store.undo();
    assert_eq!(store.snapshot(), loaded);
    store.redo();
    assert_eq!(store.snapshot(), removed);
}

#[tokio::test]
async fn mutation_after_undo_clears_redo() {
    let mut store = empty_store();
    store.add_node(NodePatch::new().with_label("A"), Some("A")).await;
    store.undo();
    assert!(store.can_redo());

    store.add_node(NodePatch::new().with_label("B"), Some("B")).await;
    assert!(!store.can_redo());
    store.redo();
    assert_eq!(
        store
            .snapshot()
            .nodes
            .iter()
            .map(|n| n.label.as_str())
            .collect::<Vec<_>>(),
        ["B"]
    );
}

#[tokio::test]
async fn rejected_add_edge_still_snapshots_history() {
    // Validation happens after the history push, matching the
    // mutate-pessimistically-snapshot-first discipline; an undo after
    // a rejected edge is therefore a no-op on the document.
    let mut store = empty_store();
    let a = store.add_node(NodePatch::new().with_label("A"), Some("A")).await;
    let before = store.snapshot();

    assert!(store.add_edge(EdgeSpec::new(&a, "missing")).is_err());
    assert_eq!(store.snapshot(), before);
    store.undo();
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn history_is_bounded() {
    let config = test_config().with_history_limit(3);
    let mut store = GraphStore::new(Arc::new(MockCatalog::default()), &config);
    for i in 0..10 {
        store
            .add_node(NodePatch::new().with_label(format!("N{i}")), Some("A"))
            .await;
    }
    for _ in 0..10 {
        store.undo();
    }
    // Only the last three snapshots were kept.
    assert_eq!(store.snapshot().nodes.len(), 7);
}

#[tokio::test]
async fn subscribers_see_the_current_document_then_every_update() {
    let mut store = empty_store();
    store.load(wave_graph());

    let rx = store.subscribe();
    let first = rx.recv().unwrap();
    assert_eq!(first, store.snapshot());

    store.remove_elements(&["n-end".to_string()]);
    let second = rx.recv().unwrap();
    assert_eq!(second, store.snapshot());

    store.undo();
    let third = rx.recv().unwrap();
    assert_eq!(third.nodes.len(), 3);
}
