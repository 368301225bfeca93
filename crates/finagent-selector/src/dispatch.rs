//! Dispatcher boundary
//!
//! Execution of a plan is outside this crate: callers bring their own
//! transport (HTTP, MCP, in-process fakes) behind the [`Dispatcher`] trait.
//! Outcomes come back per invocation so one failing tool never hides the
//! results of the others.

use crate::plan::InvocationPlan;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

/// Result of executing one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Tool executed and returned output
    Success {
        tool_id: String,
        output: Value,
    },
    /// Tool failed; the error text is surfaced to the synthesizer
    Failure {
        tool_id: String,
        error: String,
    },
}

impl ToolOutcome {
    /// Tool id this outcome belongs to
    pub fn tool_id(&self) -> &str {
        match self {
            Self::Success { tool_id, .. } | Self::Failure { tool_id, .. } => tool_id,
        }
    }

    /// Check if the invocation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Executes invocation plans against remote tool servers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Execute every invocation in the plan, one outcome per invocation
    ///
    /// Implementations may run invocations concurrently but must return
    /// outcomes in plan order.
    async fn invoke(&self, plan: &InvocationPlan) -> Vec<ToolOutcome>;
}
