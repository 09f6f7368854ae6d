//! The editor's document model.
//!
//! [`GraphDocument`] is the complete, serializable editing state: a flat
//! list of nodes and a flat list of edges. It is the unit the store
//! snapshots for undo/redo, the value every subscriber receives, and
//! the raw `{nodes, edges}` on-disk format.
//!
//! The document is immutable by convention once published: readers get
//! an owned clone and must not assume shared structure with the store's
//! live copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{EdgeType, NodeType, Position};

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A single node of the editable graph.
///
/// `data` carries the action's full parameter payload (name,
/// description, offset_ms, steps, wait_for_steps and any free-form
/// per-action fields) as opaque JSON; the core never interprets it
/// beyond the transcoder's float-typing pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique node id (UUID v4 for editor-created nodes).
    pub id: String,
    /// Human-readable display name, unique across the document.
    pub label: String,
    /// Background color hint for the renderer.
    pub color: String,
    /// Shape hint for the renderer (e.g. `ellipse`).
    pub shape: String,
    /// Canvas position, round-tripped through GUI metadata.
    pub position: Position,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Action parameter payload; an empty object when unresolved.
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl GraphNode {
    /// True when the node carries no action parameters at all.
    #[must_use]
    pub fn has_empty_data(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// A directed edge (transition) between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique edge id (UUID v4 for editor-created edges).
    pub id: String,
    /// Id of the source node.
    pub source: String,
    /// Id of the target node.
    pub target: String,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    /// Optional trigger label; the transcoder synthesizes one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Caller-supplied overrides for node creation.
///
/// Everything is optional; the store fills in generated id, defaults,
/// and the fetched action template. Mirrors the builder style of the
/// rest of the crate.
#[derive(Clone, Debug, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub position: Option<Position>,
    pub data: Option<Value>,
}

impl NodePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Shallow-merge the set fields into an existing node.
    pub fn apply_to(&self, node: &mut GraphNode) {
        if let Some(label) = &self.label {
            node.label = label.clone();
        }
        if let Some(color) = &self.color {
            node.color = color.clone();
        }
        if let Some(shape) = &self.shape {
            node.shape = shape.clone();
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(data) = &self.data {
            node.data = data.clone();
        }
    }
}

/// Caller-supplied fields for edge creation.
#[derive(Clone, Debug, Default)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    pub label: Option<String>,
}

impl EdgeSpec {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type: EdgeType::default(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The complete editing state: all nodes and all edges.
///
/// # Examples
///
/// ```rust
/// use francolino::model::GraphDocument;
///
/// let doc: GraphDocument = serde_json::from_str(r#"{"nodes":[],"edges":[]}"#).unwrap();
/// assert!(doc.nodes.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    #[must_use]
    pub fn node_by_label(&self, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.label == label)
    }

    /// The singular start node, when the document has one.
    #[must_use]
    pub fn start_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.node_type == NodeType::Start)
    }

    /// Resolve a display label to one that is unique in this document
    /// by suffixing the smallest unused integer >= 1 on collision:
    /// `Wave`, `Wave1`, `Wave2`, ...
    #[must_use]
    pub fn dedup_label(&self, desired: &str) -> String {
        if self.node_by_label(desired).is_none() {
            return desired.to_string();
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{desired}{suffix}");
            if self.node_by_label(&candidate).is_none() {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Generate a fresh element id. Node and edge ids are UUID v4
/// strings.
#[must_use]
pub fn new_element_id() -> String {
    Uuid::new_v4().to_string()
}
