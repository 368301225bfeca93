//! Per-conversation rolling context for finagent-rs
//!
//! A [`ConversationContext`] is the only place cross-turn state lives: recent
//! subject entities, recently invoked tools, and a trimmed message window.
//! The [`ContextStore`] owns one context per conversation id, serializes
//! mutations per conversation, and keeps different conversations fully
//! independent. TTL-based eviction belongs to the external storage layer; the
//! store only exposes `evict` for it to call.

pub mod context;
pub mod store;

pub use context::{ContextCaps, ContextSummary, ConversationContext, Message, ToolUse};
pub use store::ContextStore;
