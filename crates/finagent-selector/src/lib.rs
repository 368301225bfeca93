//! Tool selection and reference resolution for finagent-rs
//!
//! This crate turns a natural-language financial query plus per-conversation
//! context into an ordered, deduplicated plan of tool invocations:
//!
//! 1. [`resolver`] binds subject entities, falling back to conversation
//!    context for anaphoric queries ("what about the fundamentals?").
//! 2. [`intent`] detects lexical signals: capability areas, time modifiers,
//!    indicator names, statement types.
//! 3. [`selector`] scores registry descriptors against the query and signals,
//!    binds parameters, and produces a [`SelectionDecision`].
//! 4. [`pipeline`] wires the steps behind the single inbound entry point and
//!    the consumed [`Dispatcher`] boundary.
//!
//! Everything up to dispatch is synchronous, in-memory, and deterministic for
//! a fixed context snapshot; repeated calls without an intervening recorded
//! turn produce identical plans and reasoning traces.

pub mod dispatch;
pub mod intent;
pub mod pipeline;
pub mod plan;
pub mod resolver;
pub mod selector;

pub use dispatch::{Dispatcher, ToolOutcome};
pub use pipeline::{QueryPipeline, TurnResult};
pub use plan::{Invocation, InvocationPlan, NoToolHint, SelectionDecision};
pub use resolver::{ReferenceResolver, ResolvedQuery};
pub use selector::Selector;
