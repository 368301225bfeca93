//! Scripted multi-turn conversation against a stub dispatcher
//!
//! Run with `cargo run -p finagent-selector --example routing_demo`.

use async_trait::async_trait;
use finagent_context::{ContextCaps, ContextStore};
use finagent_registry::ToolRegistry;
use finagent_selector::{
    Dispatcher, InvocationPlan, QueryPipeline, SelectionDecision, ToolOutcome,
};
use serde_json::json;
use std::sync::Arc;

/// Dispatcher that echoes every invocation back as a canned success
struct EchoDispatcher;

#[async_trait]
impl Dispatcher for EchoDispatcher {
    async fn invoke(&self, plan: &InvocationPlan) -> Vec<ToolOutcome> {
        plan.invocations()
            .iter()
            .map(|invocation| ToolOutcome::Success {
                tool_id: invocation.tool_id.clone(),
                output: json!({ "echo": invocation.params }),
            })
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    finagent_utils::init_tracing();
    let config = finagent_utils::RuntimeConfig::default();
    tracing::info!(app = %config.app_name, env = %config.environment, "Starting demo");

    let caps = ContextCaps {
        messages: config.message_window_cap,
        entities: config.entity_cap,
        tools: config.tool_history_cap,
    };
    let pipeline = QueryPipeline::with_contexts(
        Arc::new(ToolRegistry::builtin()?),
        ContextStore::with_caps(caps),
    );
    let dispatcher = EchoDispatcher;

    let queries = [
        "What's Apple's stock price?",
        "What about the fundamentals?",
        "Compare with Microsoft",
        "last year?",
        "What can you do?",
    ];

    for query in queries {
        println!("\n> {query}");
        let result = pipeline.run_turn(&dispatcher, "demo", query).await;

        match &result.decision {
            SelectionDecision::Plan(plan) => {
                for invocation in plan.invocations() {
                    println!(
                        "  invoke {} {}",
                        invocation.tool_id,
                        serde_json::to_string(&invocation.params)?
                    );
                }
            }
            SelectionDecision::NoToolNeeded { hint, .. } => {
                println!("  no tool needed ({hint:?})");
            }
            SelectionDecision::NeedsClarification { reason, .. } => {
                println!("  needs clarification: {reason}");
            }
        }
        for outcome in &result.outcomes {
            println!("  outcome {} success={}", outcome.tool_id(), outcome.is_success());
        }
    }

    let summary = pipeline.context_summary("demo");
    println!("\ncontext: {}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
