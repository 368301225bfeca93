//! Runtime configuration shared across the workspace

use serde::{Deserialize, Serialize};

/// Runtime configuration for the query-routing core
///
/// The cap fields feed the context crate's `ContextCaps` at wiring time; see
/// the routing demo for the mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Maximum messages retained per conversation window
    pub message_window_cap: usize,
    /// Maximum distinct entities tracked per conversation
    pub entity_cap: usize,
    /// Maximum tool invocations remembered per conversation
    pub tool_history_cap: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_name: "finagent-rs".to_string(),
            environment: "development".to_string(),
            message_window_cap: 50,
            entity_cap: 10,
            tool_history_cap: 20,
        }
    }
}
