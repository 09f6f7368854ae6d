//! Palette actions and the action-catalog collaborator.
//!
//! An *action* is a named, parameterized robot behavior. The catalog
//! server owns the definitions; the editor consumes a palette listing
//! (`GET /actions`), fetches full parameter templates on node creation
//! (`GET /actions/{name}`), and can register or delete definitions. A
//! synthetic `Init` action is always prepended client-side and is never
//! subject to deletion.
//!
//! [`ActionCatalog`] is the seam: the store and transcoder take it as a
//! trait object so tests can substitute an in-memory catalog, and
//! [`HttpActionCatalog`] is the production implementation.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::EditorConfig;

/// A palette entry: enough to render a draggable action and color the
/// node it creates. The full parameter template is fetched separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub name: String,
    /// Material icon name shown in the palette.
    pub icon: String,
    #[serde(rename = "defaultColor")]
    pub default_color: String,
}

/// The synthetic `Init` palette entry.
///
/// Always present, always first, never deletable; dropping it onto the
/// canvas creates the graph's start node.
#[must_use]
pub fn init_action() -> Action {
    Action {
        id: "action-init".to_string(),
        name: "Init".to_string(),
        icon: "play_circle".to_string(),
        default_color: "#9ccc65".to_string(),
    }
}

/// Failures talking to the action catalog.
///
/// Template-fetch failures are treated as transient by callers (the
/// store degrades to an empty parameter set); command failures
/// (create/delete) surface to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("catalog request failed: {source}")]
    #[diagnostic(code(francolino::actions::http))]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("catalog returned {status} for {what}")]
    #[diagnostic(code(francolino::actions::status))]
    Status {
        status: reqwest::StatusCode,
        what: String,
    },

    /// The synthetic `Init` action cannot be deleted.
    #[error("action '{name}' is protected and cannot be deleted")]
    #[diagnostic(
        code(francolino::actions::protected),
        help("The synthetic Init action is a client-side fixture, not a server definition.")
    )]
    Protected { name: String },
}

/// Collaborator seam for the action catalog server.
#[async_trait]
pub trait ActionCatalog: Send + Sync {
    /// Palette listing, with the synthetic `Init` action prepended.
    async fn list_actions(&self) -> Result<Vec<Action>, CatalogError>;

    /// Full parameter template for a single action.
    async fn action_template(&self, name: &str) -> Result<Value, CatalogError>;

    /// Register a new action definition server-side.
    async fn create_action(&self, definition: &Value) -> Result<(), CatalogError>;

    /// Remove an action definition server-side.
    async fn delete_action(&self, name: &str) -> Result<(), CatalogError>;
}

/// HTTP implementation of [`ActionCatalog`] against the pyicub-style
/// REST surface under `{base}/pyicub/{robot}/{app}`.
pub struct HttpActionCatalog {
    client: reqwest::Client,
    prefix: String,
}

impl HttpActionCatalog {
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
}

#[async_trait]
impl ActionCatalog for HttpActionCatalog {
    async fn list_actions(&self) -> Result<Vec<Action>, CatalogError> {
        let url = self.url("actions");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                status: response.status(),
                what: "action listing".to_string(),
            });
        }
        let mut actions: Vec<Action> = response.json().await?;
        actions.insert(0, init_action());
        debug!(count = actions.len(), "loaded action palette");
        Ok(actions)
    }

    async fn action_template(&self, name: &str) -> Result<Value, CatalogError> {
        let url = self.url(&format!("actions/{name}"));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                status: response.status(),
                what: format!("template for '{name}'"),
            });
        }
        Ok(response.json().await?)
    }

    async fn create_action(&self, definition: &Value) -> Result<(), CatalogError> {
        let url = self.url("actions");
        let response = self.client.post(&url).json(definition).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                status: response.status(),
                what: "action creation".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_action(&self, name: &str) -> Result<(), CatalogError> {
        if name == "Init" {
            return Err(CatalogError::Protected {
                name: name.to_string(),
            });
        }
        let url = self.url(&format!("actions/{name}/delete"));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                status: response.status(),
                what: format!("deletion of '{name}'"),
            });
        }
        Ok(())
    }
}

/// Validation failure for an individually-imported action definition,
/// carrying every problem found rather than just the first.
#[derive(Debug, Error, Diagnostic)]
#[error("invalid action definition: {}", issues.join("; "))]
#[diagnostic(
    code(francolino::actions::invalid_schema),
    help("Allowed top-level keys: name, description, offset_ms, steps, wait_for_steps.")
)]
pub struct ActionSchemaError {
    pub issues: Vec<String>,
}

/// Strictly validate a single-action import against the allow-listed
/// schema.
///
/// Required: `name` (non-empty string), `steps` (array),
/// `wait_for_steps` (array). Optional: `description` (string or null),
/// `offset_ms` (number or null). Any unknown top-level key is an
/// error; all problems are reported together.
pub fn validate_action_definition(definition: &Value) -> Result<(), ActionSchemaError> {
    const ALLOWED: [&str; 5] = [
        "name",
        "description",
        "offset_ms",
        "steps",
        "wait_for_steps",
    ];

    let mut issues = Vec::new();

    let Some(object) = definition.as_object() else {
        return Err(ActionSchemaError {
            issues: vec!["definition must be a JSON object".to_string()],
        });
    };

    for key in object.keys() {
        if !ALLOWED.contains(&key.as_str()) {
            issues.push(format!("unknown key '{key}'"));
        }
    }

    match object.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        Some(Value::String(_)) => issues.push("'name' must be a non-empty string".to_string()),
        Some(_) => issues.push("'name' must be a string".to_string()),
        None => issues.push("missing required key 'name'".to_string()),
    }

    match object.get("description") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push("'description' must be a string or null".to_string()),
    }

    match object.get("offset_ms") {
        None | Some(Value::Null) | Some(Value::Number(_)) => {}
        Some(_) => issues.push("'offset_ms' must be a number or null".to_string()),
    }

    for required_array in ["steps", "wait_for_steps"] {
        match object.get(required_array) {
            Some(Value::Array(_)) => {}
            Some(_) => issues.push(format!("'{required_array}' must be an array")),
            None => issues.push(format!("missing required key '{required_array}'")),
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ActionSchemaError { issues })
    }
}
