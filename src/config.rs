//! Editor-wide configuration context.
//!
//! [`EditorConfig`] is the explicit context object passed into the
//! store, transcoder, tracker and HTTP clients. There are no
//! process-wide singletons: each component receives (a clone of) the
//! config it needs, which keeps every piece testable in isolation.
//!
//! Defaults can be overridden through the environment
//! (`FRANCOLINO_BASE_URL`, `FRANCOLINO_ROBOT`, `FRANCOLINO_APP`),
//! resolved through dotenvy so a local `.env` file works during
//! development.

use std::time::Duration;

use crate::fsm::floats::FloatKeyTable;
use crate::types::Position;

/// Parameters of the metadata-less import layout: the start node is
/// placed at `origin` and action nodes are distributed evenly on a
/// circle of `radius` around it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackLayout {
    pub origin: Position,
    pub radius: f64,
}

impl Default for FallbackLayout {
    fn default() -> Self {
        Self {
            origin: Position::new(0.0, 0.0),
            radius: 300.0,
        }
    }
}

/// Application-wide context shared by the editor core components.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Base URL of the automation server, without the REST prefix.
    pub base_url: String,
    /// Robot name segment of the pyicub REST prefix.
    pub robot_name: String,
    /// Application name segment of the pyicub REST prefix.
    pub app_name: String,
    /// Maximum number of undo snapshots retained.
    pub history_limit: usize,
    /// Period of the execution tracker's poll loop.
    pub poll_interval: Duration,
    /// Keys whose integral values must serialize as floats.
    pub float_keys: FloatKeyTable,
    /// Layout used when importing an FSM without GUI metadata.
    pub fallback_layout: FallbackLayout,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: resolve_env("FRANCOLINO_BASE_URL", "http://127.0.0.1:9001"),
            robot_name: resolve_env("FRANCOLINO_ROBOT", "icub"),
            app_name: resolve_env("FRANCOLINO_APP", "francolino"),
            history_limit: 20,
            poll_interval: Duration::from_millis(250),
            float_keys: FloatKeyTable::default(),
            fallback_layout: FallbackLayout::default(),
        }
    }
}

fn resolve_env(key: &str, fallback: &str) -> String {
    dotenvy::dotenv().ok();
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl EditorConfig {
    /// Full REST prefix shared by every backend endpoint:
    /// `{base_url}/pyicub/{robot}/{app}`.
    #[must_use]
    pub fn rest_prefix(&self) -> String {
        format!(
            "{}/pyicub/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.robot_name,
            self.app_name
        )
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_robot(mut self, robot_name: impl Into<String>) -> Self {
        self.robot_name = robot_name.into();
        self
    }

    #[must_use]
    pub fn with_app(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_float_keys(mut self, float_keys: FloatKeyTable) -> Self {
        self.float_keys = float_keys;
        self
    }
}
