//! Core vocabulary for the FrancOlino editor core.
//!
//! This module defines the small enums the rest of the crate speaks in:
//! node and edge classifications for the editable graph, and the
//! per-node execution status the live tracker maintains.
//!
//! # Key Types
//!
//! - [`NodeType`]: start / action / end classification of a graph node
//! - [`EdgeType`]: visual/semantic style of a transition edge
//! - [`ExecutionStatus`]: live state of a node while an FSM runs
//! - [`Position`]: canvas coordinates carried through GUI metadata
//!
//! # Examples
//!
//! ```rust
//! use francolino::types::{EdgeType, ExecutionStatus, NodeType};
//!
//! let start = NodeType::from_action_kind("Init");
//! assert_eq!(start, NodeType::Start);
//!
//! // Wire encoding matches the document formats
//! assert_eq!(EdgeType::BiArrow.as_str(), "bi-arrow");
//! assert!(ExecutionStatus::Inactive.is_idle());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the synthetic initial state every backend FSM routes through.
///
/// The backend model always enters and re-enters the machine via this
/// state; the editor maps it to the singular [`NodeType::Start`] node.
pub const INIT_STATE: &str = "init";

/// Classification of a node within the editable graph.
///
/// Any graph destined for export must contain exactly one `Start` node;
/// the transcoder maps it to the backend's synthetic [`INIT_STATE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The unique entry point; exported as `initial_state = "init"`.
    Start,
    /// A named, parameterized robot behavior.
    Action,
    /// A terminal marker node with no action payload of its own.
    End,
}

impl NodeType {
    /// Classify a palette action kind the way the editor palette does:
    /// the synthetic `Init` action creates the start node, `End` a
    /// terminal node, and everything else an action node.
    #[must_use]
    pub fn from_action_kind(kind: &str) -> Self {
        match kind {
            "Init" => NodeType::Start,
            "End" => NodeType::End,
            _ => NodeType::Action,
        }
    }

    /// Stable string form used by the document formats.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Action => "action",
            NodeType::End => "end",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style of a graph edge, mirroring the renderer's edge classes.
///
/// The core never draws edges; the type rides along so round-tripped
/// documents keep their styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EdgeType {
    #[default]
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "dashed")]
    Dashed,
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "bi-arrow")]
    BiArrow,
}

impl EdgeType {
    /// Stable string form used by the document formats.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Line => "line",
            EdgeType::Dashed => "dashed",
            EdgeType::Arrow => "arrow",
            EdgeType::BiArrow => "bi-arrow",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live execution state of a tracked node.
///
/// Owned and mutated exclusively by the execution tracker; everything
/// else reads it. Transitions follow
/// `Inactive -> Active -> Running -> {Done | Failed | Timeout}`,
/// with completion propagating `Active` to one-hop successors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    #[default]
    Inactive,
    Active,
    Running,
    Done,
    Failed,
    Timeout,
}

impl ExecutionStatus {
    /// True for the resting state a node returns to between runs.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, ExecutionStatus::Inactive)
    }

    /// True once the node's current run has finished, however it ended.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Done | ExecutionStatus::Failed | ExecutionStatus::Timeout
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Inactive => "INACTIVE",
            ExecutionStatus::Active => "ACTIVE",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Done => "DONE",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

/// Canvas coordinates of a node, preserved through GUI metadata.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
