//! # Francolino: FSM Editor Core
//!
//! Francolino is the headless core of a finite-state-machine editor for
//! robot behaviors: an undoable graph document store, a bidirectional
//! transcoder between the visual graph and the backend's FSM format,
//! and a polling tracker that mirrors a running FSM's execution state.
//!
//! ## Core Concepts
//!
//! - **GraphDocument**: the visual graph (typed nodes, labeled edges)
//! - **GraphStore**: owns the document; snapshot history, undo/redo,
//!   cascade deletes, and publish/subscribe snapshots
//! - **FsmTranscoder**: [`fsm::to_fsm_document`] /
//!   [`fsm::to_graph_document`] convert between the graph and the
//!   backend document, preserving layout via embedded GUI metadata and
//!   forcing float typing on backend-sensitive numeric fields
//! - **ExecutionTracker**: polls the runtime backend and maintains a
//!   per-node execution status overlay
//! - **EditorSession**: the save/export/import flows gluing the above
//!   to the HTTP collaborators
//!
//! ## Quick Start
//!
//! ```no_run
//! use francolino::config::EditorConfig;
//! use francolino::model::{EdgeSpec, NodePatch};
//! use francolino::types::Position;
//! use francolino::session::EditorSession;
//!
//! # async fn demo() -> miette::Result<()> {
//! let config = EditorConfig::default();
//! let mut session = EditorSession::connect(config);
//!
//! let start = session
//!     .store_mut()
//!     .add_node(NodePatch::default().with_position(Position::new(0.0, 0.0)), Some("Init"))
//!     .await;
//! let wave = session
//!     .store_mut()
//!     .add_node(NodePatch::default().with_label("Wave"), Some("Wave"))
//!     .await;
//! session.store_mut().add_edge(EdgeSpec::new(&start, &wave))?;
//!
//! session.save_fsm().await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod coalesce;
pub mod commands;
pub mod config;
pub mod fsm;
pub mod model;
pub mod runtime;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod types;
