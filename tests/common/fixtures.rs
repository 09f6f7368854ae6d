//! Shared fixtures: in-memory backend doubles and sample documents.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use francolino::actions::{Action, ActionCatalog, CatalogError, init_action};
use francolino::config::EditorConfig;
use francolino::fsm::{FsmDocument, FsmState, FsmTransition, GuiMetadata, GuiNodeMeta};
use francolino::model::{GraphDocument, GraphEdge, GraphNode};
use francolino::runtime::{FsmRuntime, RequestStatus, RuntimeError};
use francolino::types::{EdgeType, NodeType, Position};

/// In-memory [`ActionCatalog`] double.
#[derive(Default)]
pub struct MockCatalog {
    actions: Mutex<Vec<Action>>,
    templates: Mutex<FxHashMap<String, Value>>,
    pub created: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<String>>,
    fail_all: Mutex<bool>,
}

impl MockCatalog {
    pub fn with_action(self, name: &str, template: Value) -> Self {
        self.actions.lock().push(Action {
            id: format!("action-{name}"),
            name: name.to_string(),
            icon: "bolt".to_string(),
            default_color: "#fff".to_string(),
        });
        self.templates.lock().insert(name.to_string(), template);
        self
    }

    /// Make every call fail, as if the server were unreachable.
    pub fn unreachable(self) -> Self {
        *self.fail_all.lock() = true;
        self
    }

    fn failure(&self, what: &str) -> Option<CatalogError> {
        self.fail_all.lock().then(|| CatalogError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            what: what.to_string(),
        })
    }
}

#[async_trait]
impl ActionCatalog for MockCatalog {
    async fn list_actions(&self) -> Result<Vec<Action>, CatalogError> {
        if let Some(err) = self.failure("action listing") {
            return Err(err);
        }
        let mut all = vec![init_action()];
        all.extend(self.actions.lock().iter().cloned());
        Ok(all)
    }

    async fn action_template(&self, name: &str) -> Result<Value, CatalogError> {
        if let Some(err) = self.failure("template") {
            return Err(err);
        }
        self.templates
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                what: format!("template for '{name}'"),
            })
    }

    async fn create_action(&self, definition: &Value) -> Result<(), CatalogError> {
        if let Some(err) = self.failure("action creation") {
            return Err(err);
        }
        self.created.lock().push(definition.clone());
        Ok(())
    }

    async fn delete_action(&self, name: &str) -> Result<(), CatalogError> {
        if let Some(err) = self.failure("deletion") {
            return Err(err);
        }
        self.deleted.lock().push(name.to_string());
        Ok(())
    }
}

/// Scriptable [`FsmRuntime`] double. Tests set the remote picture
/// (current state, pending request, per-request statuses) and inspect
/// what got submitted.
#[derive(Default)]
pub struct ScriptedRuntime {
    fsm: Mutex<Option<FsmDocument>>,
    state: Mutex<String>,
    request: Mutex<Option<String>>,
    statuses: Mutex<FxHashMap<String, RequestStatus>>,
    next_request: Mutex<u32>,
    pub installed: Mutex<Vec<FsmDocument>>,
    pub steps: Mutex<Vec<String>>,
}

impl ScriptedRuntime {
    pub fn with_fsm(fsm: FsmDocument) -> Self {
        let runtime = Self::default();
        *runtime.fsm.lock() = Some(fsm);
        *runtime.state.lock() = "init".to_string();
        runtime
    }

    pub fn set_state(&self, state: &str) {
        *self.state.lock() = state.to_string();
    }

    pub fn set_request(&self, id: &str, status: RequestStatus) {
        *self.request.lock() = Some(id.to_string());
        self.statuses.lock().insert(id.to_string(), status);
    }

    pub fn network_calls(&self) -> usize {
        self.installed.lock().len() + self.steps.lock().len()
    }
}

#[async_trait]
impl FsmRuntime for ScriptedRuntime {
    async fn load_fsm(&self, document: &FsmDocument) -> Result<(), RuntimeError> {
        self.installed.lock().push(document.clone());
        Ok(())
    }

    async fn full_fsm(&self) -> Result<FsmDocument, RuntimeError> {
        self.fsm.lock().clone().ok_or(RuntimeError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            what: "get_full_fsm".to_string(),
        })
    }

    async fn current_state(&self) -> Result<String, RuntimeError> {
        Ok(self.state.lock().clone())
    }

    async fn current_request(&self) -> Result<Option<String>, RuntimeError> {
        Ok(self.request.lock().clone())
    }

    async fn request_status(&self, request_id: &str) -> Result<RequestStatus, RuntimeError> {
        Ok(self
            .statuses
            .lock()
            .get(request_id)
            .copied()
            .unwrap_or(RequestStatus::Unknown))
    }

    async fn run_step(&self, trigger: &str) -> Result<String, RuntimeError> {
        self.steps.lock().push(trigger.to_string());
        let mut counter = self.next_request.lock();
        *counter += 1;
        Ok(format!("req-{counter}"))
    }
}

pub fn test_config() -> EditorConfig {
    EditorConfig::default()
}

pub fn node(id: &str, label: &str, node_type: NodeType, data: Value) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        label: label.to_string(),
        color: "#ccc".to_string(),
        shape: "ellipse".to_string(),
        position: Position::new(100.0, 100.0),
        node_type,
        data,
    }
}

pub fn edge(id: &str, source: &str, target: &str, label: Option<&str>) -> GraphEdge {
    GraphEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        edge_type: EdgeType::default(),
        label: label.map(str::to_string),
    }
}

/// Start -> Wave -> End, with a float-sensitive payload on Wave.
pub fn wave_graph() -> GraphDocument {
    GraphDocument {
        nodes: vec![
            node("n-start", "Init", NodeType::Start, json!({})),
            node(
                "n-wave",
                "Wave",
                NodeType::Action,
                json!({
                    "name": "Wave",
                    "duration": 3,
                    "steps": [{"target_joints": [10, 20.5]}],
                }),
            ),
            node("n-end", "End", NodeType::End, json!({})),
        ],
        edges: vec![
            edge("e-1", "n-start", "n-wave", Some("start")),
            edge("e-2", "n-wave", "n-end", None),
        ],
    }
}

pub fn transition(trigger: &str, source: &str, dest: &str) -> FsmTransition {
    FsmTransition {
        trigger: trigger.to_string(),
        source: source.to_string(),
        dest: dest.to_string(),
        source_id: None,
        dest_id: None,
    }
}

/// init -> a -> b -> c -> init, as the runtime backend reports it.
pub fn linear_fsm() -> FsmDocument {
    FsmDocument {
        name: "linear".to_string(),
        states: ["a", "b", "c"]
            .into_iter()
            .map(|name| FsmState {
                name: name.to_string(),
                description: None,
            })
            .collect(),
        transitions: vec![
            transition("start", "init", "a"),
            transition("a>b", "a", "b"),
            transition("b>c", "b", "c"),
            transition("c>init", "c", "init"),
        ],
        initial_state: "init".to_string(),
        actions: serde_json::Map::new(),
        gui_metadata: None,
    }
}

/// An importable FSM file with GUI metadata and embedded actions.
pub fn wave_fsm_with_metadata() -> FsmDocument {
    let mut actions = serde_json::Map::new();
    actions.insert(
        "Wave".to_string(),
        json!({"name": "Wave", "duration": 3.0, "steps": []}),
    );

    let mut nodes = BTreeMap::new();
    nodes.insert(
        "n-start".to_string(),
        GuiNodeMeta {
            label: "init".to_string(),
            position: Position::new(0.0, 0.0),
        },
    );
    nodes.insert(
        "n-wave".to_string(),
        GuiNodeMeta {
            label: "Wave".to_string(),
            position: Position::new(200.0, 80.0),
        },
    );
    nodes.insert(
        "n-end".to_string(),
        GuiNodeMeta {
            label: "End".to_string(),
            position: Position::new(400.0, 80.0),
        },
    );

    FsmDocument {
        name: "wave".to_string(),
        states: vec![
            FsmState {
                name: "Wave".to_string(),
                description: None,
            },
            FsmState {
                name: "End".to_string(),
                description: None,
            },
        ],
        transitions: vec![
            FsmTransition {
                trigger: "start".to_string(),
                source: "init".to_string(),
                dest: "Wave".to_string(),
                source_id: Some("n-start".to_string()),
                dest_id: Some("n-wave".to_string()),
            },
            FsmTransition {
                trigger: "Wave>End".to_string(),
                source: "Wave".to_string(),
                dest: "End".to_string(),
                source_id: Some("n-wave".to_string()),
                dest_id: Some("n-end".to_string()),
            },
        ],
        initial_state: "init".to_string(),
        actions,
        gui_metadata: Some(GuiMetadata { nodes }),
    }
}
