//! Invocation plans and selection decisions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One concrete tool call with bound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Tool id from the registry
    pub tool_id: String,
    /// Bound parameters, ready for the dispatcher
    pub params: Map<String, Value>,
}

/// Ordered, deduplicated set of tool calls for one query
///
/// Ordering is a presentation/merge hint for the synthesizer; the dispatcher
/// may execute calls concurrently. The reasoning trace records every
/// descriptor considered and why it was accepted or rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationPlan {
    invocations: Vec<Invocation>,
    /// Reasoning trace for observability and tests
    pub reasoning: String,
}

impl InvocationPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self {
            invocations: Vec::new(),
            reasoning: String::new(),
        }
    }

    /// Append an invocation unless an identical (tool_id, params) pair exists
    ///
    /// Returns whether the invocation was added.
    pub fn push(&mut self, invocation: Invocation) -> bool {
        if self.invocations.contains(&invocation) {
            return false;
        }
        self.invocations.push(invocation);
        true
    }

    /// The planned invocations, in order
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Number of planned invocations
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    /// Check if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

impl Default for InvocationPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Why no tool was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoToolHint {
    /// Query asks about the assistant itself; answer from the capability FAQ
    Capability,
    /// Nothing matched; answer conversationally
    Conversational,
}

/// Outcome of selection for one query
///
/// Ordinary "nothing matched" and "cannot bind a subject" conditions are
/// modeled here as values; errors are reserved for programmer and
/// configuration mistakes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SelectionDecision {
    /// Invoke these tools
    Plan(InvocationPlan),

    /// No tool applies; answer directly
    NoToolNeeded {
        hint: NoToolHint,
        reasoning: String,
    },

    /// A required subject entity could not be bound; ask instead of guessing
    NeedsClarification {
        reason: String,
        reasoning: String,
    },
}

impl SelectionDecision {
    /// The plan, if the decision is to invoke tools
    pub fn plan(&self) -> Option<&InvocationPlan> {
        match self {
            Self::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    /// The reasoning trace, whatever the decision
    pub fn reasoning(&self) -> &str {
        match self {
            Self::Plan(plan) => &plan.reasoning,
            Self::NoToolNeeded { reasoning, .. } | Self::NeedsClarification { reasoning, .. } => {
                reasoning
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation(tool_id: &str, symbol: &str) -> Invocation {
        let mut params = Map::new();
        params.insert("symbol".to_string(), json!(symbol));
        Invocation {
            tool_id: tool_id.to_string(),
            params,
        }
    }

    #[test]
    fn test_push_deduplicates_identical_calls() {
        let mut plan = InvocationPlan::new();
        assert!(plan.push(invocation("stock_data.get_price", "AAPL")));
        assert!(!plan.push(invocation("stock_data.get_price", "AAPL")));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_same_tool_different_params_allowed() {
        let mut plan = InvocationPlan::new();
        assert!(plan.push(invocation("stock_data.get_price", "AAPL")));
        assert!(plan.push(invocation("stock_data.get_price", "MSFT")));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_decision_accessors() {
        let decision = SelectionDecision::NoToolNeeded {
            hint: NoToolHint::Capability,
            reasoning: "capability query".to_string(),
        };
        assert!(decision.plan().is_none());
        assert_eq!(decision.reasoning(), "capability query");
    }

    #[test]
    fn test_decision_serializes_with_tag() {
        let decision = SelectionDecision::NoToolNeeded {
            hint: NoToolHint::Conversational,
            reasoning: String::new(),
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["decision"], "no_tool_needed");
        assert_eq!(value["hint"], "conversational");
    }
}
