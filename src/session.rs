//! Editor session: the save/export/import flows that tie the graph
//! store, the transcoder, and the backend collaborators together.
//!
//! The session owns the user-visible file name and enforces the
//! validation-before-network rule: an empty graph is rejected before
//! any request is made, and an upload failure after a successful
//! local export is reported as exactly that, so the user knows the
//! local copy is intact.

use std::path::Path;
use std::sync::Arc;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::actions::{
    ActionCatalog, ActionSchemaError, CatalogError, HttpActionCatalog,
    validate_action_definition,
};
use crate::config::EditorConfig;
use crate::fsm::{
    self, FsmDocument, ImportKind, TranscodeError, detect_import_kind, serialize_fsm,
};
use crate::model::GraphDocument;
use crate::runtime::{FsmRuntime, HttpFsmRuntime, RuntimeError};
use crate::store::GraphStore;

const DEFAULT_FILE_NAME: &str = "graph.json";

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("the graph is empty, nothing to save")]
    #[diagnostic(
        code(francolino::session::empty_graph),
        help("add at least a start node before saving or exporting")
    )]
    EmptyGraph,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("the FSM was exported locally but uploading it failed: {source}")]
    #[diagnostic(
        code(francolino::session::upload),
        help("the local document is intact, retry the upload")
    )]
    Upload {
        #[source]
        source: RuntimeError,
    },

    #[error("file access failed: {source}")]
    #[diagnostic(code(francolino::session::io))]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("the file is not valid JSON: {source}")]
    #[diagnostic(code(francolino::session::parse))]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("the file is neither a graph document nor an FSM document")]
    #[diagnostic(
        code(francolino::session::unrecognized_import),
        help("expected either {{nodes, edges}} or {{states, transitions, initial_state}}")
    )]
    UnrecognizedImport,

    #[error(transparent)]
    #[diagnostic(transparent)]
    ActionSchema(#[from] ActionSchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),
}

/// What an import produced, for the presentation layer to act on.
#[derive(Debug)]
pub enum ImportOutcome {
    /// A raw graph document was loaded verbatim.
    Graph { node_count: usize },
    /// An FSM document was transcoded and loaded. `missing_actions`
    /// lists referenced actions the catalog does not know; the caller
    /// decides whether to register them via
    /// [`EditorSession::register_missing_actions`].
    Fsm {
        document: FsmDocument,
        missing_actions: Vec<String>,
        dropped_transitions: Vec<String>,
    },
}

pub struct EditorSession {
    store: GraphStore,
    catalog: Arc<dyn ActionCatalog>,
    runtime: Arc<dyn FsmRuntime>,
    config: EditorConfig,
    file_name: String,
}

impl EditorSession {
    #[must_use]
    pub fn new(
        store: GraphStore,
        catalog: Arc<dyn ActionCatalog>,
        runtime: Arc<dyn FsmRuntime>,
        config: EditorConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            runtime,
            config,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// Build a session wired to the HTTP backend collaborators.
    #[must_use]
    pub fn connect(config: EditorConfig) -> Self {
        let catalog: Arc<dyn ActionCatalog> = Arc::new(HttpActionCatalog::new(&config));
        let runtime: Arc<dyn FsmRuntime> = Arc::new(HttpFsmRuntime::new(&config));
        let store = GraphStore::new(Arc::clone(&catalog), &config);
        Self::new(store, catalog, runtime, config)
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.file_name = if name.is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            name
        };
    }

    /// FSM name derived from the file name, without the extension.
    fn fsm_name(&self) -> &str {
        self.file_name
            .strip_suffix(".json")
            .unwrap_or(&self.file_name)
    }

    /// Install the current graph on the runtime backend as a clean
    /// FSM document. An empty graph is rejected before any network
    /// traffic happens.
    pub async fn save_fsm(&self) -> Result<(), SessionError> {
        let snapshot = self.store.snapshot();
        if snapshot.nodes.is_empty() {
            return Err(SessionError::EmptyGraph);
        }
        let document =
            fsm::to_fsm_document(&snapshot, self.fsm_name(), true, &self.config.float_keys)?;
        self.runtime
            .load_fsm(&document)
            .await
            .map_err(|source| SessionError::Upload { source })?;
        info!(name = %document.name, "FSM installed on backend");
        Ok(())
    }

    /// Serialize the current graph as a round-trippable FSM document
    /// (editor metadata included), pretty-printed.
    pub fn export_string(&self) -> Result<String, SessionError> {
        let snapshot = self.store.snapshot();
        if snapshot.nodes.is_empty() {
            return Err(SessionError::EmptyGraph);
        }
        let document =
            fsm::to_fsm_document(&snapshot, self.fsm_name(), false, &self.config.float_keys)?;
        Ok(serialize_fsm(&document)?)
    }

    pub async fn export_file(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let text = self.export_string()?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    /// Import a JSON document, auto-detecting whether it is a raw
    /// graph or an FSM, and load the result into the store.
    pub async fn import_str(&mut self, text: &str) -> Result<ImportOutcome, SessionError> {
        let value: Value = serde_json::from_str(text)?;
        match detect_import_kind(&value) {
            Some(ImportKind::Graph) => {
                let document: GraphDocument = serde_json::from_value(value)?;
                let node_count = document.nodes.len();
                self.store.load(document);
                Ok(ImportOutcome::Graph { node_count })
            }
            Some(ImportKind::Fsm) => {
                let document: FsmDocument = serde_json::from_value(value)?;
                let report = fsm::to_graph_document(
                    &document,
                    self.catalog.as_ref(),
                    &self.config.float_keys,
                    &self.config.fallback_layout,
                )
                .await?;
                self.store.load(report.document);
                Ok(ImportOutcome::Fsm {
                    document,
                    missing_actions: report.missing_actions,
                    dropped_transitions: report.dropped_transitions,
                })
            }
            None => Err(SessionError::UnrecognizedImport),
        }
    }

    pub async fn import_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ImportOutcome, SessionError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let outcome = self.import_str(&text).await?;
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            self.set_file_name(name);
        }
        Ok(outcome)
    }

    /// Register actions an imported FSM referenced that the catalog
    /// does not know, extracting their definitions from the document.
    pub async fn register_missing_actions(
        &self,
        document: &FsmDocument,
        names: &[String],
    ) -> Result<(), SessionError> {
        fsm::register_missing_actions(
            self.catalog.as_ref(),
            document,
            names,
            &self.config.float_keys,
        )
        .await?;
        Ok(())
    }

    /// Validate and upload a single action definition. Schema
    /// violations are reported as an itemized list; nothing is sent
    /// unless validation passes.
    pub async fn import_action(&self, definition: &Value) -> Result<(), SessionError> {
        validate_action_definition(definition)?;
        self.catalog.create_action(definition).await?;
        Ok(())
    }
}
