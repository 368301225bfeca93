//! Rule-based tool selection and parameter binding
//!
//! Selection never guesses: a tool whose required parameter cannot be bound
//! from the query, the context, or a declared default is dropped from the
//! plan, and a missing subject entity surfaces as a clarification request
//! rather than an invented symbol. For a fixed registry and context snapshot
//! the same query always yields the same decision and reasoning trace.

use crate::intent::{self, QuerySignal};
use crate::plan::{Invocation, InvocationPlan, NoToolHint, SelectionDecision};
use crate::resolver::ResolvedQuery;
use finagent_context::ConversationContext;
use finagent_registry::{ToolDescriptor, ToolRegistry};
use serde_json::{Map, Value};

/// Minimum lexical relevance for a tool with no capability-tag match
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Score bonus when a descriptor capability matches a detected signal
pub const CAPABILITY_MATCH_BONUS: f64 = 2.0;

/// Everything extracted from the query that parameter binding can draw on
struct BindInputs<'a> {
    symbols: &'a [String],
    period: Option<&'static str>,
    indicators: Vec<String>,
    statement: Option<&'static str>,
}

/// Why a candidate tool could not be bound
enum BindFailure {
    /// No subject symbol available from query or context
    MissingEntity,
    /// A required non-symbol parameter has no value and no default
    MissingParam(String),
}

/// Stateless query-to-plan selector
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector;

impl Selector {
    /// Create a new selector
    pub fn new() -> Self {
        Self
    }

    /// Select tools for a resolved query against a registry and context snapshot
    pub fn select(
        &self,
        resolved: &ResolvedQuery,
        registry: &ToolRegistry,
        context: &ConversationContext,
    ) -> SelectionDecision {
        let mut trace: Vec<String> = Vec::new();

        if intent::is_capability_query(&resolved.text) {
            trace.push("capability query, answered from tool summary".to_string());
            return SelectionDecision::NoToolNeeded {
                hint: NoToolHint::Capability,
                reasoning: trace.join("\n"),
            };
        }

        let signals = intent::detect_signals(&resolved.text);
        trace.push(format!("signals: {signals:?}"));

        let inputs = BindInputs {
            symbols: &resolved.symbols,
            period: intent::time_modifier(&resolved.text),
            indicators: intent::indicator_names(&resolved.text),
            statement: intent::statement_type(&resolved.text),
        };

        let mut plan = InvocationPlan::new();
        let mut missing_entity = false;

        if signals.is_empty() {
            self.select_without_signals(
                resolved,
                registry,
                context,
                &inputs,
                &mut plan,
                &mut missing_entity,
                &mut trace,
            );
        } else {
            for signal in &signals {
                let Some((tool, score)) = best_candidate(registry, &resolved.text, *signal) else {
                    trace.push(format!("{signal:?}: no candidate above threshold"));
                    continue;
                };
                trace.push(format!("{signal:?}: best candidate {} (score {score:.2})", tool.id));
                bind_and_push(tool, &inputs, &mut plan, &mut missing_entity, &mut trace);
            }
        }

        self.finish(plan, missing_entity, trace)
    }

    /// Fallbacks for queries with no capability signal
    ///
    /// A bare time modifier ("last year?") re-runs the conversation's last
    /// tool with the period updated; otherwise a lexical search over the
    /// catalog gets one shot at clearing the confidence threshold.
    #[allow(clippy::too_many_arguments)]
    fn select_without_signals(
        &self,
        resolved: &ResolvedQuery,
        registry: &ToolRegistry,
        context: &ConversationContext,
        inputs: &BindInputs<'_>,
        plan: &mut InvocationPlan,
        missing_entity: &mut bool,
        trace: &mut Vec<String>,
    ) {
        if let Some(period) = inputs.period {
            if let Some(last) = context.tool_history.last() {
                if registry.get(&last.tool_id).is_some() {
                    let mut params = last.params.clone();
                    if params.contains_key("period") {
                        params.insert("period".to_string(), Value::String(period.to_string()));
                    }
                    trace.push(format!(
                        "time follow-up: re-running {} with period {period}",
                        last.tool_id
                    ));
                    plan.push(Invocation {
                        tool_id: last.tool_id.clone(),
                        params,
                    });
                    return;
                }
            }
        }

        let hits = registry.search(&resolved.text);
        match hits.first() {
            Some(hit) if hit.score >= CONFIDENCE_THRESHOLD => {
                trace.push(format!(
                    "search fallback: {} (score {:.2})",
                    hit.id, hit.score
                ));
                // Id comes straight out of the search over the same registry
                if let Some(tool) = registry.get(&hit.id) {
                    bind_and_push(tool, inputs, plan, missing_entity, trace);
                }
            }
            Some(hit) => {
                trace.push(format!(
                    "search fallback: best hit {} (score {:.2}) below threshold {CONFIDENCE_THRESHOLD}",
                    hit.id, hit.score
                ));
            }
            None => trace.push("search fallback: no hits".to_string()),
        }
    }

    fn finish(
        &self,
        mut plan: InvocationPlan,
        missing_entity: bool,
        trace: Vec<String>,
    ) -> SelectionDecision {
        let reasoning = trace.join("\n");

        if plan.is_empty() {
            if missing_entity {
                tracing::debug!("Selection needs clarification, no subject entity");
                return SelectionDecision::NeedsClarification {
                    reason: "Which stock are you asking about?".to_string(),
                    reasoning,
                };
            }
            tracing::debug!("Selection found no applicable tool");
            return SelectionDecision::NoToolNeeded {
                hint: NoToolHint::Conversational,
                reasoning,
            };
        }

        tracing::info!(invocations = plan.len(), "Selected invocation plan");
        plan.reasoning = reasoning;
        SelectionDecision::Plan(plan)
    }
}

/// Best descriptor for one signal
///
/// A capability-tag match always beats a lexical-only match; among peers the
/// higher score wins, then the lower cost, then catalog insertion order.
/// Tools with neither a tag match nor a score above the confidence threshold
/// are not candidates at all.
fn best_candidate<'r>(
    registry: &'r ToolRegistry,
    query: &str,
    signal: QuerySignal,
) -> Option<(&'r ToolDescriptor, f64)> {
    let tag = signal.capability_tag();
    let mut best: Option<(&ToolDescriptor, f64, bool)> = None;

    for tool in registry.iter() {
        let tag_match = tool.has_capability(tag);
        let base = tool.relevance(query);
        if !tag_match && base < CONFIDENCE_THRESHOLD {
            continue;
        }
        let score = base + if tag_match { CAPABILITY_MATCH_BONUS } else { 0.0 };

        let better = match best {
            None => true,
            Some((current, current_score, current_tag)) => {
                if tag_match != current_tag {
                    tag_match
                } else if (score - current_score).abs() > f64::EPSILON {
                    score > current_score
                } else {
                    tool.cost < current.cost
                }
            }
        };
        if better {
            best = Some((tool, score, tag_match));
        }
    }

    best.map(|(tool, score, _)| (tool, score))
}

/// Bind a candidate's parameters and push the resulting invocations
fn bind_and_push(
    tool: &ToolDescriptor,
    inputs: &BindInputs<'_>,
    plan: &mut InvocationPlan,
    missing_entity: &mut bool,
    trace: &mut Vec<String>,
) {
    match bind_params(tool, inputs) {
        Ok(param_sets) => {
            for params in param_sets {
                let bound = Value::Object(params.clone()).to_string();
                if plan.push(Invocation {
                    tool_id: tool.id.clone(),
                    params,
                }) {
                    trace.push(format!("planned {} with {bound}", tool.id));
                }
            }
        }
        Err(BindFailure::MissingEntity) => {
            *missing_entity = true;
            trace.push(format!("rejected {}: no subject entity", tool.id));
        }
        Err(BindFailure::MissingParam(param)) => {
            trace.push(format!(
                "rejected {}: required param '{param}' cannot be bound",
                tool.id
            ));
        }
    }
}

/// Bind one tool's parameter schema from the query inputs
///
/// Returns one parameter map per invocation: a tool with a single-symbol
/// parameter fans out across all bound symbols, while a tool that natively
/// accepts a symbol list gets exactly one invocation.
fn bind_params(
    tool: &ToolDescriptor,
    inputs: &BindInputs<'_>,
) -> Result<Vec<Map<String, Value>>, BindFailure> {
    let per_symbol = tool.symbols_param().is_none() && tool.symbol_param().is_some();
    let targets: Vec<Option<&String>> = if per_symbol && !inputs.symbols.is_empty() {
        inputs.symbols.iter().map(Some).collect()
    } else {
        vec![inputs.symbols.last()]
    };

    let mut param_sets = Vec::with_capacity(targets.len());
    for target in targets {
        param_sets.push(bind_one(tool, inputs, target)?);
    }
    Ok(param_sets)
}

fn bind_one(
    tool: &ToolDescriptor,
    inputs: &BindInputs<'_>,
    symbol: Option<&String>,
) -> Result<Map<String, Value>, BindFailure> {
    let mut params = Map::new();

    for spec in &tool.params {
        let value = match spec.name.as_str() {
            "symbol" => symbol.map(|s| Value::String(s.clone())),
            "symbols" => (inputs.symbols.len() >= 2).then(|| {
                Value::Array(
                    inputs
                        .symbols
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                )
            }),
            "period" => inputs
                .period
                .map(|p| Value::String(p.to_string()))
                .or_else(|| spec.default.clone()),
            "indicators" => (!inputs.indicators.is_empty())
                .then(|| {
                    Value::Array(
                        inputs
                            .indicators
                            .iter()
                            .map(|i| Value::String(i.clone()))
                            .collect(),
                    )
                })
                .or_else(|| spec.default.clone()),
            "statement_type" => inputs
                .statement
                .map(|s| Value::String(s.to_string()))
                .or_else(|| spec.default.clone()),
            _ => spec.default.clone(),
        };

        match value {
            Some(value) => {
                params.insert(spec.name.clone(), value);
            }
            None if spec.required => {
                return Err(match spec.name.as_str() {
                    "symbol" | "symbols" => BindFailure::MissingEntity,
                    _ => BindFailure::MissingParam(spec.name.clone()),
                });
            }
            None => {}
        }
    }

    Ok(params)
}
