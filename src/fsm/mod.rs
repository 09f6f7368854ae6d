//! The backend FSM document format and its transcoding.
//!
//! [`FsmDocument`] is the robot-readable serialization of a finite
//! state machine: named states, triggered transitions, a synthetic
//! `init` initial state, the full action payloads, and (in the
//! editor-facing variant) GUI metadata for faithful visual
//! reconstruction. It is created transiently on export and parsed
//! transiently on import; the editor's durable state is always the
//! [`GraphDocument`](crate::model::GraphDocument).
//!
//! Submodules:
//! - [`floats`]: the float-typing table and tag/untag passes
//! - [`export`]: graph -> FSM conversion
//! - [`import`]: FSM -> graph reconstruction

pub mod export;
pub mod floats;
pub mod import;

pub use export::to_fsm_document;
pub use import::{ImportReport, register_missing_actions, to_graph_document};

use std::collections::BTreeMap;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::Position;

/// A named state of the machine. `description` mirrors the action's
/// description and may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FsmState {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A triggered transition between two states.
///
/// `source_id`/`dest_id` are editor-only: they pin transitions to
/// exact node identities so same-labeled nodes and self-loops survive
/// reimport. The clean (backend) variant strips them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FsmTransition {
    pub trigger: String,
    pub source: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_id: Option<String>,
}

/// Per-node visual metadata embedded in the editor-facing variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuiNodeMeta {
    pub label: String,
    pub position: Position,
}

/// Editor-only metadata block; stripped before backend submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuiMetadata {
    /// Keyed by node id; `BTreeMap` keeps the serialized form stable.
    pub nodes: BTreeMap<String, GuiNodeMeta>,
}

/// The complete backend FSM document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FsmDocument {
    pub name: String,
    pub states: Vec<FsmState>,
    pub transitions: Vec<FsmTransition>,
    pub initial_state: String,
    #[serde(default)]
    pub actions: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gui_metadata: Option<GuiMetadata>,
}

impl FsmDocument {
    /// Strip everything the backend does not understand: the GUI
    /// metadata block and the per-transition identity fields.
    pub fn strip_editor_metadata(&mut self) {
        self.gui_metadata = None;
        for transition in &mut self.transitions {
            transition.source_id = None;
            transition.dest_id = None;
        }
    }
}

/// Serialize an [`FsmDocument`] to the UTF-8 JSON text written to disk
/// or posted to the backend. Float-tagged values print with a decimal
/// point (`5.0`), which is the entire point of the tagging pass.
pub fn serialize_fsm(document: &FsmDocument) -> Result<String, TranscodeError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Shape of an imported JSON file, auto-detected from its top-level
/// keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// A raw editor document: `{nodes, edges}`.
    Graph,
    /// A backend FSM document: `{states, transitions, initial_state}`.
    Fsm,
}

/// Detect whether a parsed JSON value is a raw graph document or an
/// FSM document. Returns `None` for anything else.
#[must_use]
pub fn detect_import_kind(value: &Value) -> Option<ImportKind> {
    let object = value.as_object()?;
    if object.contains_key("nodes") && object.contains_key("edges") {
        return Some(ImportKind::Graph);
    }
    if object.contains_key("states")
        && object.contains_key("transitions")
        && object.contains_key("initial_state")
    {
        return Some(ImportKind::Fsm);
    }
    None
}

/// Failures of the graph <-> FSM transcoding.
#[derive(Debug, Error, Diagnostic)]
pub enum TranscodeError {
    /// Export was attempted on a document with no nodes.
    #[error("the graph is empty; there is nothing to export")]
    #[diagnostic(code(francolino::fsm::empty_graph))]
    EmptyGraph,

    /// An exportable graph needs exactly one start node.
    #[error("the graph has no start node")]
    #[diagnostic(
        code(francolino::fsm::missing_start),
        help("Drop the Init action onto the canvas to create one.")
    )]
    MissingStart,

    /// The imported document collapses to zero or one usable node.
    #[error("the FSM document is unusable: fewer than two resolvable nodes")]
    #[diagnostic(code(francolino::fsm::degenerate))]
    DegenerateFsm,

    #[error(transparent)]
    #[diagnostic(code(francolino::fsm::serde_json))]
    Serde(#[from] serde_json::Error),
}
