//! Live execution overlay for an installed FSM.
//!
//! [`ExecutionTracker`] mirrors the remote machine's progress onto a
//! local per-node status map. It holds its own flat node/edge view
//! (state names and triggers, no positions) built from the installed
//! FSM document, and advances statuses from periodic polls of the
//! runtime backend.
//!
//! The remote model routes every run through the synthetic `init`
//! state; the tracker remaps that plumbing away so the designated
//! first state reads as the entry point and loop-back transitions
//! read as terminal markers.

mod poller;

pub use poller::PollHandle;

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::fsm::FsmDocument;
use crate::runtime::{FsmRuntime, RequestStatus, RuntimeError};
use crate::types::{ExecutionStatus, INIT_STATE};

/// How many status polls a restart request gets before we give up
/// waiting for it to settle during load.
const RESTART_POLL_ATTEMPTS: u32 = 40;

#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("FSM runtime call failed: {source}")]
    #[diagnostic(code(francolino::tracker::runtime))]
    Runtime {
        #[from]
        source: RuntimeError,
    },

    #[error("installed FSM has no states besides the implicit init")]
    #[diagnostic(
        code(francolino::tracker::unusable_fsm),
        help("install an FSM with at least one action state before tracking it")
    )]
    UnusableFsm,

    #[error("installed FSM has no transition out of init")]
    #[diagnostic(code(francolino::tracker::missing_start))]
    MissingStartTransition,
}

/// A state of the installed FSM plus its tracked execution status.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedNode {
    pub name: String,
    pub description: Option<String>,
    pub status: ExecutionStatus,
}

#[derive(Clone, Debug)]
struct TrackedEdge {
    trigger: String,
    source: String,
    dest: String,
}

#[derive(Clone, Debug)]
struct StartNode {
    name: String,
    start_trigger: String,
}

#[derive(Clone, Debug)]
struct TerminalNode {
    name: String,
    restart_trigger: String,
}

#[derive(Default)]
struct TrackerState {
    nodes: Vec<TrackedNode>,
    edges: Vec<TrackedEdge>,
    start: Option<StartNode>,
    terminals: Vec<TerminalNode>,
    /// Name of the state the remote last reported (`"init"` when idle).
    current: Option<String>,
    /// Last node whose request settled; guards repeated RUNNING marks.
    previous: Option<String>,
    loading: bool,
}

impl TrackerState {
    fn reset(&mut self) {
        *self = TrackerState {
            loading: true,
            ..TrackerState::default()
        };
    }

    fn node_mut(&mut self, name: &str) -> Option<&mut TrackedNode> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|node| node.name == name)
    }

    fn set_status(&mut self, name: &str, status: ExecutionStatus) {
        if let Some(node) = self.node_mut(name) {
            node.status = status;
        }
    }

    fn is_terminal(&self, name: &str) -> bool {
        self.terminals.iter().any(|term| term.name == name)
    }

    fn restart_trigger(&self, name: &str) -> Option<&str> {
        self.terminals
            .iter()
            .find(|term| term.name == name)
            .map(|term| term.restart_trigger.as_str())
    }

    /// Names reachable from `name` in one hop along outgoing edges.
    fn reachable_from(&self, name: &str) -> FxHashSet<String> {
        self.edges
            .iter()
            .filter(|edge| edge.source == name)
            .map(|edge| edge.dest.clone())
            .collect()
    }

    fn activate_reachable(&mut self, from: &str) {
        for dest in self.reachable_from(from) {
            self.set_status(&dest, ExecutionStatus::Active);
        }
    }
}

/// Polls the FSM runtime and maintains the node-status overlay.
pub struct ExecutionTracker {
    runtime: Arc<dyn FsmRuntime>,
    state: Mutex<TrackerState>,
    poll_interval: Duration,
}

impl ExecutionTracker {
    #[must_use]
    pub fn new(runtime: Arc<dyn FsmRuntime>, config: &EditorConfig) -> Self {
        Self {
            runtime,
            state: Mutex::new(TrackerState::default()),
            poll_interval: config.poll_interval,
        }
    }

    /// Whether an FSM load is in progress. Poll ticks are skipped
    /// while this is set so they never read a half-built node set.
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Current per-node status view, in load order (start node first).
    pub fn nodes(&self) -> Vec<TrackedNode> {
        self.state.lock().nodes.clone()
    }

    pub fn node_status(&self, name: &str) -> Option<ExecutionStatus> {
        self.state
            .lock()
            .nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| node.status)
    }

    /// Name of the state the remote last reported, `"init"` when idle.
    pub fn current_state(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    /// Fetch the installed FSM and the remote's current state, rebuild
    /// the tracked node set, and seed initial statuses.
    pub async fn load(&self) -> Result<(), TrackerError> {
        self.state.lock().reset();
        let result = self.load_inner().await;
        if result.is_err() {
            self.state.lock().loading = false;
        }
        result
    }

    async fn load_inner(&self) -> Result<(), TrackerError> {
        let (fsm, current) =
            tokio::join!(self.runtime.full_fsm(), self.runtime.current_state());
        let fsm = fsm?;
        let current = current?;

        let (nodes, edges, start, terminals) = build_tracked_view(&fsm)?;
        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            terminals = terminals.len(),
            current = %current,
            "tracked FSM loaded"
        );

        {
            let mut state = self.state.lock();
            state.nodes = nodes;
            state.edges = edges;
            state.terminals = terminals;
            state.start = Some(start.clone());
        }

        // The guard must not outlive this expression: an `if let`
        // scrutinee lives for the whole branch, which would hold the
        // lock across the awaits below.
        let restart = {
            let state = self.state.lock();
            state.restart_trigger(&current).map(str::to_string)
        };

        if current == INIT_STATE {
            let mut state = self.state.lock();
            state.set_status(&start.name, ExecutionStatus::Active);
            state.current = Some(INIT_STATE.to_string());
        } else if let Some(restart) = restart {
            // Remote parked at a terminal node: nudge it back to init
            // so the overlay starts from a clean idle picture.
            let request = self.runtime.run_step(&restart).await?;
            if self.await_settled(&request).await? == RequestStatus::Done {
                let mut state = self.state.lock();
                state.set_status(&start.name, ExecutionStatus::Active);
                state.current = Some(INIT_STATE.to_string());
            } else {
                warn!(request = %request, "restart request did not settle cleanly");
            }
        } else {
            let mut state = self.state.lock();
            state.current = Some(current.clone());
            state.activate_reachable(&current);
        }

        self.state.lock().loading = false;
        Ok(())
    }

    async fn await_settled(&self, request: &str) -> Result<RequestStatus, TrackerError> {
        for _ in 0..RESTART_POLL_ATTEMPTS {
            let status = self.runtime.request_status(request).await?;
            if !matches!(status, RequestStatus::Unknown | RequestStatus::Running) {
                return Ok(status);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Ok(RequestStatus::Unknown)
    }

    /// One poll step: read the remote state and the pending request's
    /// status, and fold them into the overlay. No-op while loading.
    pub async fn tick(&self) -> Result<(), TrackerError> {
        if self.is_loading() {
            return Ok(());
        }

        let current = self.runtime.current_state().await?;
        if current == INIT_STATE {
            let mut state = self.state.lock();
            if let Some(previous) = state.previous.clone() {
                state.set_status(&previous, ExecutionStatus::Inactive);
            }
            return Ok(());
        }

        if !self.state.lock().has_node(&current) {
            return Ok(());
        }

        let Some(request) = self.runtime.current_request().await? else {
            return Ok(());
        };
        let status = self.runtime.request_status(&request).await?;

        let mut state = self.state.lock();
        state.current = Some(current.clone());
        match status {
            RequestStatus::Running => {
                if state.previous.as_deref() != Some(current.as_str()) {
                    state.set_status(&current, ExecutionStatus::Running);
                }
            }
            RequestStatus::Done => {
                state.set_status(&current, ExecutionStatus::Done);
                let reachable = state.reachable_from(&current);
                let stale: Vec<String> = state
                    .nodes
                    .iter()
                    .filter(|node| {
                        node.status == ExecutionStatus::Active
                            && !reachable.contains(&node.name)
                    })
                    .map(|node| node.name.clone())
                    .collect();
                for name in stale {
                    state.set_status(&name, ExecutionStatus::Inactive);
                }
                state.activate_reachable(&current);
                state.previous = Some(current.clone());

                if state.is_terminal(&current) {
                    let start = state.start.as_ref().map(|s| s.name.clone());
                    let names: Vec<String> =
                        state.nodes.iter().map(|node| node.name.clone()).collect();
                    for name in names {
                        if Some(&name) != start.as_ref() {
                            state.set_status(&name, ExecutionStatus::Inactive);
                        }
                    }
                }
            }
            RequestStatus::Failed => {
                state.set_status(&current, ExecutionStatus::Failed);
                state.activate_reachable(&current);
                state.previous = Some(current.clone());
            }
            RequestStatus::TimedOut => {
                state.set_status(&current, ExecutionStatus::Timeout);
                state.activate_reachable(&current);
                state.previous = Some(current.clone());
            }
            RequestStatus::Unknown => {}
        }
        Ok(())
    }

    /// React to a node click: only `ACTIVE` nodes accept one. Submits
    /// the trigger for the current-node-to-clicked-node transition
    /// (or the start trigger for the start node) and returns without
    /// waiting for completion; the next tick observes the effect.
    pub async fn handle_node_click(&self, name: &str) -> Result<(), TrackerError> {
        let (restart, trigger) = {
            let state = self.state.lock();
            let clicked = state.nodes.iter().find(|node| node.name == name);
            if clicked.map(|node| node.status) != Some(ExecutionStatus::Active) {
                return Ok(());
            }

            let restart = state
                .current
                .as_deref()
                .and_then(|current| state.restart_trigger(current))
                .map(str::to_string);

            let start = state.start.as_ref();
            let trigger = if start.map(|s| s.name.as_str()) == Some(name) {
                start.map(|s| s.start_trigger.clone())
            } else {
                state
                    .edges
                    .iter()
                    .find(|edge| {
                        state.current.as_deref() == Some(edge.source.as_str())
                            && edge.dest == name
                    })
                    .map(|edge| edge.trigger.clone())
            };
            (restart, trigger)
        };

        // A terminal current node needs its restart trigger fired
        // before the next step can be accepted.
        if let Some(restart) = restart {
            let _ = self.runtime.run_step(&restart).await?;
        }

        let Some(trigger) = trigger else {
            debug!(node = %name, "no transition from current node, click ignored");
            return Ok(());
        };
        let _ = self.runtime.run_step(&trigger).await?;
        Ok(())
    }
}

/// Flatten an FSM document into the tracker's node/edge view,
/// remapping the implicit `init` round-trip plumbing.
fn build_tracked_view(
    fsm: &FsmDocument,
) -> Result<(Vec<TrackedNode>, Vec<TrackedEdge>, StartNode, Vec<TerminalNode>), TrackerError> {
    let mut nodes: Vec<TrackedNode> = fsm
        .states
        .iter()
        .filter(|state| state.name != INIT_STATE)
        .map(|state| TrackedNode {
            name: state.name.clone(),
            description: state.description.clone(),
            status: ExecutionStatus::Inactive,
        })
        .collect();
    if nodes.is_empty() {
        return Err(TrackerError::UnusableFsm);
    }

    let mut edges: Vec<TrackedEdge> = fsm
        .transitions
        .iter()
        .map(|transition| TrackedEdge {
            trigger: transition.trigger.clone(),
            source: transition.source.clone(),
            dest: transition.dest.clone(),
        })
        .collect();

    let start_edge = edges
        .iter()
        .find(|edge| edge.source == INIT_STATE)
        .cloned()
        .ok_or(TrackerError::MissingStartTransition)?;
    let start = StartNode {
        name: start_edge.dest.clone(),
        start_trigger: start_edge.trigger.clone(),
    };

    // Surface the start node first so presentation lays it out as the
    // entry point.
    if let Some(index) = nodes.iter().position(|node| node.name == start.name) {
        nodes.swap(0, index);
    }

    edges.retain(|edge| edge.source != INIT_STATE);
    let mut terminals = Vec::new();
    for edge in &mut edges {
        if edge.dest == INIT_STATE {
            terminals.push(TerminalNode {
                name: edge.source.clone(),
                restart_trigger: edge.trigger.clone(),
            });
            edge.dest = start.name.clone();
        }
    }

    Ok((nodes, edges, start, terminals))
}
