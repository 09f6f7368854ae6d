//! FSM document -> graph reconstruction.
//!
//! When the document carries `gui_metadata.nodes`, reconstruction is
//! metadata-driven: prior node identities and positions come back
//! exactly. Without it, a fallback layout places the start node at a
//! fixed origin and spreads the action nodes evenly on a circle, with
//! fresh ids. Action payloads resolve from the document's own
//! `actions` map first and the live catalog second; either miss
//! degrades to an empty parameter set with a warning.
//!
//! Transitions resolve their endpoints by explicit `source_id`/
//! `dest_id` when present (exact identity; an unknown id drops the
//! transition) and by label otherwise, with `init` mapped to the
//! start node. Unresolvable transitions are dropped with a warning and
//! the import proceeds with the remainder.

use std::f64::consts::TAU;

use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::warn;

use super::floats::{FloatKeyTable, untag_floats};
use super::{FsmDocument, TranscodeError};
use crate::actions::{ActionCatalog, CatalogError};
use crate::config::FallbackLayout;
use crate::model::{GraphDocument, GraphEdge, GraphNode, new_element_id};
use crate::types::{EdgeType, INIT_STATE, NodeType, Position};

/// Result of an FSM import: the reconstructed document plus everything
/// the caller may want to surface, namely transitions that could not
/// be resolved and action names the catalog does not know yet.
#[derive(Clone, Debug, Default)]
pub struct ImportReport {
    pub document: GraphDocument,
    /// Triggers of transitions dropped for unresolvable endpoints.
    pub dropped_transitions: Vec<String>,
    /// Referenced action names absent from the live catalog. The
    /// caller decides whether to [`register_missing_actions`] or
    /// proceed with unresolved parameters.
    pub missing_actions: Vec<String>,
}

fn classify_label(label: &str) -> NodeType {
    match label {
        INIT_STATE => NodeType::Start,
        "End" => NodeType::End,
        _ => NodeType::Action,
    }
}

async fn resolve_payload(
    name: &str,
    fsm: &FsmDocument,
    catalog: &dyn ActionCatalog,
    floats: &FloatKeyTable,
) -> Value {
    if let Some(payload) = fsm.actions.get(name) {
        let mut payload = payload.clone();
        untag_floats(&mut payload, floats);
        return payload;
    }
    match catalog.action_template(name).await {
        Ok(mut payload) => {
            untag_floats(&mut payload, floats);
            payload
        }
        Err(err) => {
            warn!(action = name, %err, "no parameter payload available; node imported unresolved");
            serde_json::json!({})
        }
    }
}

/// Reconstruct a [`GraphDocument`] from an FSM document.
///
/// # Errors
///
/// [`TranscodeError::DegenerateFsm`] when fewer than two non-start
/// nodes survive reconstruction; such a document is unusable rather
/// than a one-node graph.
pub async fn to_graph_document(
    fsm: &FsmDocument,
    catalog: &dyn ActionCatalog,
    floats: &FloatKeyTable,
    layout: &FallbackLayout,
) -> Result<ImportReport, TranscodeError> {
    let mut nodes: Vec<GraphNode> = Vec::new();

    let has_metadata = fsm
        .gui_metadata
        .as_ref()
        .is_some_and(|meta| !meta.nodes.is_empty());

    if has_metadata {
        let meta = fsm.gui_metadata.as_ref().unwrap();
        for (id, entry) in &meta.nodes {
            let node_type = classify_label(&entry.label);
            let data = if node_type == NodeType::Start {
                serde_json::json!({})
            } else {
                resolve_payload(&entry.label, fsm, catalog, floats).await
            };
            nodes.push(GraphNode {
                id: id.clone(),
                label: if node_type == NodeType::Start {
                    INIT_STATE.to_string()
                } else {
                    entry.label.clone()
                },
                color: "#ccc".to_string(),
                shape: "ellipse".to_string(),
                position: entry.position,
                node_type,
                data,
            });
        }
    } else {
        let state_names: Vec<&str> = fsm
            .states
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| *name != INIT_STATE)
            .collect();

        nodes.push(GraphNode {
            id: new_element_id(),
            label: INIT_STATE.to_string(),
            color: "#ccc".to_string(),
            shape: "ellipse".to_string(),
            position: layout.origin,
            node_type: NodeType::Start,
            data: serde_json::json!({}),
        });

        let count = state_names.len().max(1) as f64;
        for (index, name) in state_names.iter().enumerate() {
            let angle = TAU * index as f64 / count;
            let position = Position::new(
                layout.origin.x + layout.radius * angle.cos(),
                layout.origin.y + layout.radius * angle.sin(),
            );
            let data = resolve_payload(name, fsm, catalog, floats).await;
            nodes.push(GraphNode {
                id: new_element_id(),
                label: (*name).to_string(),
                color: "#ccc".to_string(),
                shape: "ellipse".to_string(),
                position,
                node_type: classify_label(name),
                data,
            });
        }
    }

    let non_start = nodes
        .iter()
        .filter(|n| n.node_type != NodeType::Start)
        .count();
    if non_start < 2 {
        return Err(TranscodeError::DegenerateFsm);
    }

    let start_id = nodes
        .iter()
        .find(|n| n.node_type == NodeType::Start)
        .map(|n| n.id.clone());

    let document_stub = GraphDocument {
        nodes,
        edges: Vec::new(),
    };

    let mut edges = Vec::new();
    let mut dropped = Vec::new();
    for transition in &fsm.transitions {
        let source = resolve_endpoint(
            &document_stub,
            transition.source_id.as_deref(),
            &transition.source,
            start_id.as_deref(),
        );
        let target = resolve_endpoint(
            &document_stub,
            transition.dest_id.as_deref(),
            &transition.dest,
            start_id.as_deref(),
        );
        match (source, target) {
            (Some(source), Some(target)) => edges.push(GraphEdge {
                id: new_element_id(),
                source,
                target,
                edge_type: EdgeType::default(),
                label: Some(transition.trigger.clone()),
            }),
            _ => {
                warn!(
                    trigger = %transition.trigger,
                    source = %transition.source,
                    dest = %transition.dest,
                    "transition endpoint could not be resolved; dropped"
                );
                dropped.push(transition.trigger.clone());
            }
        }
    }

    let missing_actions = missing_action_names(fsm, catalog).await;

    Ok(ImportReport {
        document: GraphDocument {
            nodes: document_stub.nodes,
            edges,
        },
        dropped_transitions: dropped,
        missing_actions,
    })
}

/// Endpoint resolution: explicit id wins and is authoritative; when
/// present but unknown the transition drops rather than guessing by
/// label. Label lookup is the fallback, with `init` mapped to the
/// start node.
fn resolve_endpoint(
    doc: &GraphDocument,
    explicit_id: Option<&str>,
    label: &str,
    start_id: Option<&str>,
) -> Option<String> {
    if let Some(id) = explicit_id {
        return doc.node(id).map(|n| n.id.clone());
    }
    if label == INIT_STATE {
        return start_id.map(str::to_string);
    }
    doc.node_by_label(label).map(|n| n.id.clone())
}

async fn missing_action_names(fsm: &FsmDocument, catalog: &dyn ActionCatalog) -> Vec<String> {
    let mut referenced: FxHashSet<&str> = fsm.states.iter().map(|s| s.name.as_str()).collect();
    for transition in &fsm.transitions {
        referenced.insert(transition.source.as_str());
        referenced.insert(transition.dest.as_str());
    }
    referenced.remove(INIT_STATE);

    let known: FxHashSet<String> = match catalog.list_actions().await {
        Ok(actions) => actions.into_iter().map(|a| a.name).collect(),
        Err(err) => {
            // Without a reachable catalog there is nothing to reconcile
            // against; the import still proceeds.
            warn!(%err, "could not list catalog actions; skipping reconciliation");
            return Vec::new();
        }
    };

    let mut missing: Vec<String> = referenced
        .into_iter()
        .filter(|name| !known.contains(*name))
        .map(str::to_string)
        .collect();
    missing.sort();
    missing
}

/// Register actions the catalog is missing, extracting their
/// definitions from the imported document. Names without an embedded
/// definition are skipped with a warning; the first backend failure
/// aborts (the user re-triggers manually, there is no automatic
/// retry).
pub async fn register_missing_actions(
    catalog: &dyn ActionCatalog,
    fsm: &FsmDocument,
    names: &[String],
    floats: &FloatKeyTable,
) -> Result<(), CatalogError> {
    for name in names {
        let Some(definition) = fsm.actions.get(name) else {
            warn!(action = %name, "no embedded definition to register; skipped");
            continue;
        };
        let mut definition = definition.clone();
        untag_floats(&mut definition, floats);
        catalog.create_action(&definition).await?;
    }
    Ok(())
}
