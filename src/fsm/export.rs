//! Graph -> FSM document conversion.
//!
//! Maps the editor's node/edge model onto the backend's
//! state/transition/action document. The start node becomes the
//! synthetic `init` initial state; action and end nodes become named
//! states; edges become transitions over state *labels* (with the
//! start endpoint spelled `init`), carrying `source_id`/`dest_id` so
//! reimport can disambiguate same-labeled nodes. The `clean` variant
//! strips everything backend-unknown.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use super::floats::{FloatKeyTable, tag_floats};
use super::{FsmDocument, FsmState, FsmTransition, GuiMetadata, GuiNodeMeta, TranscodeError};
use crate::model::{GraphDocument, GraphNode};
use crate::types::{INIT_STATE, NodeType};

/// Action payload keys that never leave the editor.
const INTERNAL_ACTION_KEYS: [&str; 2] = ["id", "_palette"];

fn endpoint_label(node: &GraphNode) -> &str {
    if node.node_type == NodeType::Start {
        INIT_STATE
    } else {
        node.label.as_str()
    }
}

fn export_action_payload(node: &GraphNode, floats: &FloatKeyTable) -> Value {
    let mut payload = node.data.clone();
    if let Some(map) = payload.as_object_mut() {
        for key in INTERNAL_ACTION_KEYS {
            map.remove(key);
        }
        map.insert("name".to_string(), Value::String(node.label.clone()));
    }
    tag_floats(&mut payload, floats);
    payload
}

/// Convert the current graph into an [`FsmDocument`].
///
/// With `clean = true` the result is the backend variant: no GUI
/// metadata, no per-transition identity fields. With `clean = false`
/// the result is the round-trip-faithful file variant.
///
/// # Errors
///
/// [`TranscodeError::EmptyGraph`] when there are no nodes at all and
/// [`TranscodeError::MissingStart`] when no start node exists.
pub fn to_fsm_document(
    doc: &GraphDocument,
    name: &str,
    clean: bool,
    floats: &FloatKeyTable,
) -> Result<FsmDocument, TranscodeError> {
    if doc.nodes.is_empty() {
        return Err(TranscodeError::EmptyGraph);
    }
    let start = doc.start_node().ok_or(TranscodeError::MissingStart)?;

    let mut states = Vec::new();
    let mut actions = serde_json::Map::new();
    let mut gui_nodes = BTreeMap::new();

    gui_nodes.insert(
        start.id.clone(),
        GuiNodeMeta {
            label: INIT_STATE.to_string(),
            position: start.position,
        },
    );

    for node in &doc.nodes {
        match node.node_type {
            NodeType::Start => {}
            NodeType::Action => {
                states.push(state_entry(node));
                actions.insert(node.label.clone(), export_action_payload(node, floats));
                gui_nodes.insert(
                    node.id.clone(),
                    GuiNodeMeta {
                        label: node.label.clone(),
                        position: node.position,
                    },
                );
            }
            NodeType::End => {
                states.push(state_entry(node));
                // End markers only carry an action payload when the
                // user actually attached one.
                if !node.has_empty_data() {
                    actions.insert(node.label.clone(), export_action_payload(node, floats));
                }
                gui_nodes.insert(
                    node.id.clone(),
                    GuiNodeMeta {
                        label: node.label.clone(),
                        position: node.position,
                    },
                );
            }
        }
    }

    let mut transitions = Vec::new();
    for edge in &doc.edges {
        let (Some(source), Some(target)) = (doc.node(&edge.source), doc.node(&edge.target)) else {
            warn!(edge = %edge.id, "edge references a missing node; skipped on export");
            continue;
        };
        let source_label = endpoint_label(source);
        let dest_label = endpoint_label(target);
        let trigger = edge
            .label
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("{source_label}>{dest_label}"));
        transitions.push(FsmTransition {
            trigger,
            source: source_label.to_string(),
            dest: dest_label.to_string(),
            source_id: (!clean).then(|| source.id.clone()),
            dest_id: (!clean).then(|| target.id.clone()),
        });
    }

    Ok(FsmDocument {
        name: name.to_string(),
        states,
        transitions,
        initial_state: INIT_STATE.to_string(),
        actions,
        gui_metadata: (!clean).then_some(GuiMetadata { nodes: gui_nodes }),
    })
}

fn state_entry(node: &GraphNode) -> FsmState {
    let description = node
        .data
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    FsmState {
        name: node.label.clone(),
        description,
    }
}
