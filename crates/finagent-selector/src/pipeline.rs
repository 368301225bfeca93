//! Query pipeline: the single inbound entry point
//!
//! Every query enters through [`QueryPipeline::select`], whatever transport
//! carried it. The pipeline snapshots the conversation's context, resolves
//! references against the snapshot, and hands the resolved query to the
//! selector. Dispatch and context recording are layered on top by
//! [`QueryPipeline::run_turn`].

use crate::dispatch::{Dispatcher, ToolOutcome};
use crate::plan::SelectionDecision;
use crate::resolver::{ReferenceResolver, ResolvedQuery};
use crate::selector::Selector;
use finagent_context::{ContextStore, ContextSummary};
use finagent_registry::ToolRegistry;
use serde_json::Map;
use std::sync::Arc;

/// Everything produced by one full turn
#[derive(Debug)]
pub struct TurnResult {
    /// Selection decision for the query
    pub decision: SelectionDecision,
    /// Dispatcher outcomes, one per planned invocation; empty when no tool ran
    pub outcomes: Vec<ToolOutcome>,
}

/// Wires resolver, selector, registry, and context store together
pub struct QueryPipeline {
    registry: Arc<ToolRegistry>,
    contexts: ContextStore,
    resolver: ReferenceResolver,
    selector: Selector,
}

impl QueryPipeline {
    /// Create a pipeline over an already-loaded registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_contexts(registry, ContextStore::new())
    }

    /// Create a pipeline with an explicit context store, e.g. custom window caps
    pub fn with_contexts(registry: Arc<ToolRegistry>, contexts: ContextStore) -> Self {
        Self {
            registry,
            contexts,
            resolver: ReferenceResolver::new(),
            selector: Selector::new(),
        }
    }

    /// Create a pipeline over the embedded production catalog
    pub fn builtin() -> finagent_registry::Result<Self> {
        Ok(Self::new(Arc::new(ToolRegistry::builtin()?)))
    }

    /// The registry this pipeline selects from
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Select tools for a query within a conversation
    ///
    /// Read-only: selection operates on a detached context snapshot and
    /// records nothing. Repeated calls without an intervening
    /// [`record_turn`](Self::record_turn) return identical decisions.
    pub fn select(&self, conversation_id: &str, query: &str) -> SelectionDecision {
        let (_, decision) = self.resolve_and_select(conversation_id, query);
        decision
    }

    /// Record a completed turn into the conversation's context
    pub fn record_turn(
        &self,
        conversation_id: &str,
        query: &str,
        entities: &[String],
        tools: &[(String, Map<String, serde_json::Value>)],
    ) {
        self.contexts.record_turn(conversation_id, query, entities, tools);
    }

    /// Run one full turn: select, dispatch, record
    ///
    /// The turn is recorded only after dispatch returns, so a turn that dies
    /// mid-flight leaves the context untouched. Decisions that plan no tools
    /// still record the query and any resolved entities.
    pub async fn run_turn(
        &self,
        dispatcher: &dyn Dispatcher,
        conversation_id: &str,
        query: &str,
    ) -> TurnResult {
        let (resolved, decision) = self.resolve_and_select(conversation_id, query);

        let (outcomes, tools) = match decision.plan() {
            Some(plan) => {
                let outcomes = dispatcher.invoke(plan).await;
                let tools: Vec<(String, Map<String, serde_json::Value>)> = plan
                    .invocations()
                    .iter()
                    .map(|i| (i.tool_id.clone(), i.params.clone()))
                    .collect();
                (outcomes, tools)
            }
            None => (Vec::new(), Vec::new()),
        };

        self.contexts
            .record_turn(conversation_id, query, &resolved.symbols, &tools);

        TurnResult { decision, outcomes }
    }

    /// Condensed view of a conversation's context
    pub fn context_summary(&self, conversation_id: &str) -> ContextSummary {
        self.contexts.snapshot(conversation_id).summary()
    }

    /// Drop a conversation's context, returning whether one existed
    pub fn evict(&self, conversation_id: &str) -> bool {
        self.contexts.evict(conversation_id)
    }

    fn resolve_and_select(
        &self,
        conversation_id: &str,
        query: &str,
    ) -> (ResolvedQuery, SelectionDecision) {
        let snapshot = self.contexts.snapshot(conversation_id);
        let resolved = self.resolver.resolve(query, &snapshot);
        let decision = self.selector.select(&resolved, &self.registry, &snapshot);

        tracing::info!(
            conversation_id,
            symbols = ?resolved.symbols,
            planned = decision.plan().map_or(0, crate::plan::InvocationPlan::len),
            "Processed query"
        );

        (resolved, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockDispatcher;
    use crate::plan::NoToolHint;
    use serde_json::json;

    fn pipeline() -> QueryPipeline {
        QueryPipeline::builtin().unwrap()
    }

    fn echo_dispatcher() -> MockDispatcher {
        let mut mock = MockDispatcher::new();
        mock.expect_invoke().returning(|plan| {
            plan.invocations()
                .iter()
                .map(|i| ToolOutcome::Success {
                    tool_id: i.tool_id.clone(),
                    output: json!({"ok": true}),
                })
                .collect()
        });
        mock
    }

    #[test]
    fn test_followup_resolves_against_recorded_turn() {
        let pipeline = pipeline();

        let first = pipeline.select("conv-1", "What's Apple's stock price?");
        let plan = first.plan().expect("expected a plan");
        assert_eq!(plan.invocations()[0].tool_id, "stock_data.get_price");
        pipeline.record_turn(
            "conv-1",
            "What's Apple's stock price?",
            &["AAPL".to_string()],
            &[],
        );

        let second = pipeline.select("conv-1", "What about the fundamentals?");
        let plan = second.plan().expect("expected a plan");
        assert_eq!(plan.invocations()[0].tool_id, "stock_data.get_fundamentals");
        assert_eq!(plan.invocations()[0].params["symbol"], json!("AAPL"));
    }

    #[test]
    fn test_conversations_do_not_leak() {
        let pipeline = pipeline();
        pipeline.record_turn("conv-1", "Analyze AAPL", &["AAPL".to_string()], &[]);

        let decision = pipeline.select("conv-2", "What about the fundamentals?");
        assert!(matches!(
            decision,
            SelectionDecision::NeedsClarification { .. }
        ));
    }

    #[test]
    fn test_select_is_read_only() {
        let pipeline = pipeline();

        let first = pipeline.select("conv-1", "What's Apple's stock price?");
        let second = pipeline.select("conv-1", "What's Apple's stock price?");

        assert_eq!(
            first.plan().map(crate::plan::InvocationPlan::invocations),
            second.plan().map(crate::plan::InvocationPlan::invocations)
        );
        assert_eq!(first.reasoning(), second.reasoning());
        assert_eq!(pipeline.context_summary("conv-1").interaction_count, 0);
    }

    #[tokio::test]
    async fn test_run_turn_dispatches_and_records() {
        let pipeline = pipeline();
        let dispatcher = echo_dispatcher();

        let result = pipeline
            .run_turn(&dispatcher, "conv-1", "What's Apple's stock price?")
            .await;

        assert_eq!(result.outcomes.len(), 1);
        assert!(result.outcomes[0].is_success());

        let summary = pipeline.context_summary("conv-1");
        assert_eq!(summary.last_entity.as_deref(), Some("AAPL"));
        assert_eq!(summary.last_tool.as_deref(), Some("stock_data.get_price"));
        assert_eq!(summary.interaction_count, 1);
    }

    #[tokio::test]
    async fn test_run_turn_surfaces_partial_failure() {
        let pipeline = pipeline();
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_invoke().returning(|plan| {
            plan.invocations()
                .iter()
                .enumerate()
                .map(|(i, inv)| {
                    if i == 0 {
                        ToolOutcome::Success {
                            tool_id: inv.tool_id.clone(),
                            output: json!({"ok": true}),
                        }
                    } else {
                        ToolOutcome::Failure {
                            tool_id: inv.tool_id.clone(),
                            error: "server unreachable".to_string(),
                        }
                    }
                })
                .collect()
        });

        let result = pipeline
            .run_turn(
                &dispatcher,
                "conv-1",
                "What patterns do you see in AAPL and MSFT?",
            )
            .await;

        assert_eq!(result.outcomes.len(), 2);
        assert!(result.outcomes[0].is_success());
        assert!(!result.outcomes[1].is_success());

        // Failed invocations still count as attempted tools in the context
        let summary = pipeline.context_summary("conv-1");
        assert_eq!(summary.recent_tools.len(), 2);
    }

    #[tokio::test]
    async fn test_run_turn_skips_dispatch_without_plan() {
        let pipeline = pipeline();
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_invoke().times(0);

        let result = pipeline
            .run_turn(&dispatcher, "conv-1", "What can you do?")
            .await;

        assert!(matches!(
            result.decision,
            SelectionDecision::NoToolNeeded {
                hint: NoToolHint::Capability,
                ..
            }
        ));
        assert!(result.outcomes.is_empty());
        assert_eq!(pipeline.context_summary("conv-1").interaction_count, 1);
    }

    #[tokio::test]
    async fn test_bare_period_followup_reuses_last_tool() {
        let pipeline = pipeline();
        let dispatcher = echo_dispatcher();

        pipeline
            .run_turn(&dispatcher, "conv-1", "What's Apple's stock price?")
            .await;
        let result = pipeline.run_turn(&dispatcher, "conv-1", "last year?").await;

        let plan = result.decision.plan().expect("expected a plan");
        assert_eq!(plan.invocations()[0].tool_id, "stock_data.get_price");
        assert_eq!(plan.invocations()[0].params["symbol"], json!("AAPL"));
        assert_eq!(plan.invocations()[0].params["period"], json!("1y"));
    }
}
