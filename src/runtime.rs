//! The live FSM runtime collaborator.
//!
//! The automation server hosts the currently-installed FSM and
//! executes its steps on the robot. The editor pushes documents to it
//! (`load_fsm`), pulls the installed document back (`get_full_fsm`),
//! and the execution tracker polls its current state, correlates the
//! in-flight async request, and submits triggers.
//!
//! [`FsmRuntime`] is the seam the tracker and session depend on;
//! [`HttpFsmRuntime`] is the reqwest implementation against the
//! pyicub-style REST surface.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::fsm::FsmDocument;

/// Status of an async step request as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    /// No status yet, or a status string the editor does not know.
    Unknown,
    Running,
    Done,
    Failed,
    TimedOut,
}

impl RequestStatus {
    /// Parse the backend's status string; anything unrecognized maps
    /// to [`RequestStatus::Unknown`] and is ignored by the tracker.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RUNNING" => RequestStatus::Running,
            "DONE" => RequestStatus::Done,
            "FAILED" => RequestStatus::Failed,
            "TIMEOUT" => RequestStatus::TimedOut,
            _ => RequestStatus::Unknown,
        }
    }
}

/// Failures talking to the FSM runtime backend.
#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("runtime request failed: {source}")]
    #[diagnostic(code(francolino::runtime::http))]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("runtime returned {status} for {what}")]
    #[diagnostic(code(francolino::runtime::status))]
    Status {
        status: reqwest::StatusCode,
        what: String,
    },
}

/// Collaborator seam for the FSM runtime backend.
#[async_trait]
pub trait FsmRuntime: Send + Sync {
    /// Install a new FSM (the clean document variant).
    async fn load_fsm(&self, document: &FsmDocument) -> Result<(), RuntimeError>;

    /// Retrieve the currently installed FSM document.
    async fn full_fsm(&self) -> Result<FsmDocument, RuntimeError>;

    /// Name of the state the machine is currently in (`"init"` when idle).
    async fn current_state(&self) -> Result<String, RuntimeError>;

    /// Id of the current async step request, when one exists.
    async fn current_request(&self) -> Result<Option<String>, RuntimeError>;

    /// Status of a previously-issued step request.
    async fn request_status(&self, request_id: &str) -> Result<RequestStatus, RuntimeError>;

    /// Submit a trigger; returns the request id to correlate against.
    async fn run_step(&self, trigger: &str) -> Result<String, RuntimeError>;
}

/// HTTP implementation of [`FsmRuntime`].
pub struct HttpFsmRuntime {
    client: reqwest::Client,
    prefix: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

impl HttpFsmRuntime {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            prefix: config.rest_prefix(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.prefix)
    }

    fn check(
        response: &reqwest::Response,
        what: &str,
    ) -> Result<(), RuntimeError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RuntimeError::Status {
                status: response.status(),
                what: what.to_string(),
            })
        }
    }
}

#[async_trait]
impl FsmRuntime for HttpFsmRuntime {
    async fn load_fsm(&self, document: &FsmDocument) -> Result<(), RuntimeError> {
        let response = self
            .client
            .post(self.url("load_fsm"))
            .json(document)
            .send()
            .await?;
        Self::check(&response, "load_fsm")
    }

    async fn full_fsm(&self) -> Result<FsmDocument, RuntimeError> {
        let response = self.client.post(self.url("get_full_fsm")).send().await?;
        Self::check(&response, "get_full_fsm")?;
        Ok(response.json().await?)
    }

    async fn current_state(&self) -> Result<String, RuntimeError> {
        let response = self
            .client
            .post(self.url("fsm.getCurrentState"))
            .send()
            .await?;
        Self::check(&response, "fsm.getCurrentState")?;
        Ok(response.json().await?)
    }

    async fn current_request(&self) -> Result<Option<String>, RuntimeError> {
        let response = self
            .client
            .post(self.url("fsm.getCurrentAsyncRequestID"))
            .send()
            .await?;
        Self::check(&response, "fsm.getCurrentAsyncRequestID")?;
        let id: Option<String> = response.json().await?;
        Ok(id.filter(|id| !id.is_empty()))
    }

    async fn request_status(&self, request_id: &str) -> Result<RequestStatus, RuntimeError> {
        let response = self
            .client
            .get(self.url(&format!("requests/{request_id}/status")))
            .send()
            .await?;
        Self::check(&response, "request status")?;
        let body: StatusBody = response.json().await?;
        Ok(RequestStatus::parse(&body.status))
    }

    async fn run_step(&self, trigger: &str) -> Result<String, RuntimeError> {
        let response = self
            .client
            .post(self.url("fsm.runStep"))
            .json(&serde_json::json!({ "trigger": trigger }))
            .send()
            .await?;
        Self::check(&response, "fsm.runStep")?;
        Ok(response.json().await?)
    }
}
