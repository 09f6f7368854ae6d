//! Authoritative graph state with undo/redo and synchronous pub/sub.
//!
//! [`GraphStore`] is the single mutator of the live [`GraphDocument`].
//! Every mutating operation snapshots the pre-mutation state into the
//! bounded undo history, applies the change, and republishes the new
//! document to every subscriber, in order. Readers only ever see owned
//! snapshots; nothing outside the store can alias its live state.
//!
//! # Operations
//!
//! - [`load`](GraphStore::load): replace the whole document
//! - [`add_node`](GraphStore::add_node): create a node, fetching its
//!   action template from the catalog (failure degrades to an empty
//!   parameter set; editing never depends on the backend being up)
//! - [`update_node`](GraphStore::update_node): shallow-merge changes
//! - [`add_edge`](GraphStore::add_edge): create an edge with endpoint
//!   validation
//! - [`remove_elements`](GraphStore::remove_elements): cascade removal
//! - [`undo`](GraphStore::undo) / [`redo`](GraphStore::redo)
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use francolino::actions::HttpActionCatalog;
//! use francolino::config::EditorConfig;
//! use francolino::model::NodePatch;
//! use francolino::store::GraphStore;
//!
//! # async fn example() {
//! let config = EditorConfig::default();
//! let catalog = Arc::new(HttpActionCatalog::new(&config));
//! let mut store = GraphStore::new(catalog, &config);
//!
//! let id = store.add_node(NodePatch::new().with_label("Wave"), Some("wave")).await;
//! store.undo();
//! assert!(store.snapshot().node(&id).is_none());
//! # }
//! ```

mod history;

pub use history::History;

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::actions::ActionCatalog;
use crate::config::EditorConfig;
use crate::model::{EdgeSpec, GraphDocument, GraphEdge, GraphNode, NodePatch, new_element_id};
use crate::types::{NodeType, Position};

/// Rejections from edge creation.
///
/// These are logged at the call site and carry no partial mutation;
/// the history snapshot pushed on entry remains either way.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// Edge creation requires both endpoints.
    #[error("edge requires both a source and a target node")]
    #[diagnostic(code(francolino::store::missing_endpoint))]
    MissingEndpoint,

    /// An endpoint does not reference any node in the document.
    #[error("edge endpoint '{id}' does not reference an existing node")]
    #[diagnostic(code(francolino::store::unknown_endpoint))]
    UnknownEndpoint { id: String },

    /// An identical (source, target, type) edge already exists.
    #[error("duplicate edge from '{from}' to '{to}'")]
    #[diagnostic(
        code(francolino::store::duplicate_edge),
        help("Parallel edges between the same pair must differ in type.")
    )]
    DuplicateEdge { from: String, to: String },
}

/// Sole owner and mutator of the live graph document.
pub struct GraphStore {
    document: GraphDocument,
    history: History,
    subscribers: Vec<flume::Sender<GraphDocument>>,
    catalog: Arc<dyn ActionCatalog>,
}

impl GraphStore {
    #[must_use]
    pub fn new(catalog: Arc<dyn ActionCatalog>, config: &EditorConfig) -> Self {
        Self {
            document: GraphDocument::default(),
            history: History::new(config.history_limit),
            subscribers: Vec::new(),
            catalog,
        }
    }

    /// Owned snapshot of the current document.
    #[must_use]
    pub fn snapshot(&self) -> GraphDocument {
        self.document.clone()
    }

    /// Subscribe to document updates.
    ///
    /// The receiver immediately observes the current document, then
    /// every subsequent publish, in publish order. Dropped receivers
    /// are pruned on the next publish.
    pub fn subscribe(&mut self) -> flume::Receiver<GraphDocument> {
        let (tx, rx) = flume::unbounded();
        // New subscribers start from the current state, not from the
        // next mutation.
        let _ = tx.send(self.document.clone());
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self) {
        let doc = self.document.clone();
        self.subscribers.retain(|tx| tx.send(doc.clone()).is_ok());
    }

    fn record_history(&mut self) {
        self.history.record(self.document.clone());
    }

    /// Replace the whole document, snapshotting the prior state first.
    pub fn load(&mut self, document: GraphDocument) {
        self.record_history();
        self.document = document;
        self.publish();
    }

    /// Create a node and return its generated id.
    ///
    /// `action_kind` selects the palette action whose parameter
    /// template seeds `data`; the synthetic `Init`/`End` kinds map to
    /// start/end nodes and carry no template. A failed template fetch
    /// is logged and degrades to an empty parameter set; it never
    /// prevents the node from being created.
    pub async fn add_node(&mut self, patch: NodePatch, action_kind: Option<&str>) -> String {
        self.record_history();

        let node_type = action_kind.map_or(NodeType::Action, NodeType::from_action_kind);
        let data = match (action_kind, node_type) {
            (Some(kind), NodeType::Action) => match self.catalog.action_template(kind).await {
                Ok(template) => template,
                Err(err) => {
                    warn!(action = kind, %err, "could not load action template; node keeps an empty parameter set");
                    serde_json::json!({})
                }
            },
            _ => patch.data.clone().unwrap_or_else(|| serde_json::json!({})),
        };

        let desired_label = patch
            .label
            .clone()
            .or_else(|| action_kind.map(str::to_string))
            .unwrap_or_default();
        let label = self.document.dedup_label(&desired_label);

        let mut node = GraphNode {
            id: new_element_id(),
            label,
            color: "#ccc".to_string(),
            shape: "ellipse".to_string(),
            position: Position::new(100.0, 100.0),
            node_type,
            data,
        };
        if let Some(color) = &patch.color {
            node.color = color.clone();
        }
        if let Some(shape) = &patch.shape {
            node.shape = shape.clone();
        }
        if let Some(position) = patch.position {
            node.position = position;
        }

        let id = node.id.clone();
        self.document.nodes.push(node);
        self.publish();
        id
    }

    /// Shallow-merge `patch` into the node with the given id.
    ///
    /// A no-op (no history entry, no publish) when the id is unknown.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) {
        if self.document.node(id).is_none() {
            debug!(node = id, "update_node ignored: unknown id");
            return;
        }
        self.record_history();
        if let Some(node) = self.document.node_mut(id) {
            patch.apply_to(node);
        }
        self.publish();
    }

    /// Create an edge and return its generated id.
    ///
    /// Rejections are logged and leave the document untouched. The
    /// history snapshot pushed on entry remains either way.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Result<String, StoreError> {
        self.record_history();

        if spec.source.is_empty() || spec.target.is_empty() {
            error!("source and target are required for an edge");
            return Err(StoreError::MissingEndpoint);
        }
        for endpoint in [&spec.source, &spec.target] {
            if self.document.node(endpoint).is_none() {
                error!(endpoint = %endpoint, "edge endpoint does not exist");
                return Err(StoreError::UnknownEndpoint {
                    id: endpoint.clone(),
                });
            }
        }
        let duplicate = self.document.edges.iter().any(|e| {
            e.source == spec.source && e.target == spec.target && e.edge_type == spec.edge_type
        });
        if duplicate {
            warn!(source = %spec.source, target = %spec.target, "duplicate edge rejected");
            return Err(StoreError::DuplicateEdge {
                from: spec.source,
                to: spec.target,
            });
        }

        let edge = GraphEdge {
            id: new_element_id(),
            source: spec.source,
            target: spec.target,
            edge_type: spec.edge_type,
            label: spec.label,
        };
        let id = edge.id.clone();
        self.document.edges.push(edge);
        self.publish();
        Ok(id)
    }

    /// Remove every element whose id is in `ids`, cascading to edges
    /// that reference a removed node. A no-op on empty input.
    pub fn remove_elements(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.record_history();

        let ids: FxHashSet<&str> = ids.iter().map(String::as_str).collect();
        let removed_nodes: FxHashSet<String> = self
            .document
            .nodes
            .iter()
            .filter(|n| ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();

        self.document.nodes.retain(|n| !ids.contains(n.id.as_str()));
        self.document.edges.retain(|e| {
            !ids.contains(e.id.as_str())
                && !removed_nodes.contains(&e.source)
                && !removed_nodes.contains(&e.target)
        });
        self.publish();
    }

    /// Restore the previous document state. A no-op when the undo
    /// stack is empty.
    pub fn undo(&mut self) {
        if let Some(previous) = self.history.step_back(self.document.clone()) {
            self.document = previous;
            self.publish();
        }
    }

    /// Reapply the most recently undone state. A no-op when the redo
    /// stack is empty.
    pub fn redo(&mut self) {
        if let Some(next) = self.history.step_forward(self.document.clone()) {
            self.document = next;
            self.publish();
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
