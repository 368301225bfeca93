//! Conversation context: bounded windows of entities, tools, and messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Default for messages retained in the rolling window
pub const MESSAGE_WINDOW_CAP: usize = 50;

/// Default for distinct entities tracked
pub const ENTITY_CAP: usize = 10;

/// Default for tool invocations remembered
pub const TOOL_HISTORY_CAP: usize = 20;

/// Window bounds for one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCaps {
    /// Messages retained in the rolling window
    pub messages: usize,
    /// Distinct entities tracked
    pub entities: usize,
    /// Tool invocations remembered
    pub tools: usize,
}

impl Default for ContextCaps {
    fn default() -> Self {
        Self {
            messages: MESSAGE_WINDOW_CAP,
            entities: ENTITY_CAP,
            tools: TOOL_HISTORY_CAP,
        }
    }
}

/// One message in the rolling window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role ("user" or "assistant")
    pub role: String,
    /// Message text
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One recorded tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    /// Tool id that was invoked
    pub tool_id: String,
    /// Parameters the tool was invoked with
    pub params: Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Rolling per-conversation state
///
/// `entities` is ordered most-recent-last; the last element is the default
/// referent for ambiguous follow-up queries. Re-mentioning an entity moves it
/// to the end rather than duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Owning conversation id
    pub conversation_id: String,
    /// Resolved subject entities, most-recent-last, deduplicated
    pub entities: Vec<String>,
    /// Recently invoked tools, oldest first
    pub tool_history: Vec<ToolUse>,
    /// Recent messages, oldest first
    pub message_window: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Number of turns recorded into this context
    pub interaction_count: u64,
    /// Window bounds applied on every recorded turn
    #[serde(default)]
    pub caps: ContextCaps,
}

impl ConversationContext {
    /// Create an empty context for a conversation with default window bounds
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self::with_caps(conversation_id, ContextCaps::default())
    }

    /// Create an empty context with explicit window bounds
    pub fn with_caps(conversation_id: impl Into<String>, caps: ContextCaps) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            entities: Vec::new(),
            tool_history: Vec::new(),
            message_window: Vec::new(),
            created_at: now,
            last_active: now,
            interaction_count: 0,
            caps,
        }
    }

    /// The most recently mentioned entity, if any
    pub fn last_entity(&self) -> Option<&str> {
        self.entities.last().map(String::as_str)
    }

    /// The last `n` entities, most recent last
    pub fn recent_entities(&self, n: usize) -> &[String] {
        let start = self.entities.len().saturating_sub(n);
        &self.entities[start..]
    }

    /// The most recently invoked tool id, if any
    pub fn last_tool(&self) -> Option<&str> {
        self.tool_history.last().map(|t| t.tool_id.as_str())
    }

    /// Record one completed turn
    ///
    /// Applies every window update in one pass so a caller holding the
    /// per-conversation lock observes all-or-nothing semantics.
    pub fn record_turn(
        &mut self,
        query: &str,
        entities: &[String],
        tools: &[(String, Map<String, serde_json::Value>)],
    ) {
        let now = Utc::now();

        self.push_message("user", query, now);

        for entity in entities {
            self.track_entity(entity);
        }

        for (tool_id, params) in tools {
            self.tool_history.push(ToolUse {
                tool_id: tool_id.clone(),
                params: params.clone(),
                timestamp: now,
            });
        }
        if self.tool_history.len() > self.caps.tools {
            let excess = self.tool_history.len() - self.caps.tools;
            self.tool_history.drain(..excess);
        }

        self.interaction_count += 1;
        self.last_active = now;
    }

    /// Append a message, evicting the oldest beyond the window cap
    fn push_message(&mut self, role: &str, text: &str, timestamp: DateTime<Utc>) {
        self.message_window.push(Message {
            role: role.to_string(),
            text: text.to_string(),
            timestamp,
        });
        if self.message_window.len() > self.caps.messages {
            let excess = self.message_window.len() - self.caps.messages;
            self.message_window.drain(..excess);
        }
    }

    /// Move an entity to the most-recent position, deduplicated
    fn track_entity(&mut self, entity: &str) {
        if let Some(pos) = self.entities.iter().position(|e| e == entity) {
            let existing = self.entities.remove(pos);
            self.entities.push(existing);
        } else {
            self.entities.push(entity.to_string());
            if self.entities.len() > self.caps.entities {
                let excess = self.entities.len() - self.caps.entities;
                self.entities.drain(..excess);
            }
        }
    }

    /// Check whether this context has been idle longer than `max_age_seconds`
    pub fn is_expired(&self, max_age_seconds: i64) -> bool {
        let max_age = chrono::Duration::seconds(max_age_seconds);
        Utc::now() - self.last_active > max_age
    }

    /// Compact summary for observability and synthesizer prompts
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            last_entity: self.last_entity().map(ToString::to_string),
            recent_entities: self.recent_entities(5).to_vec(),
            last_tool: self.last_tool().map(ToString::to_string),
            recent_tools: self
                .tool_history
                .iter()
                .rev()
                .take(5)
                .rev()
                .map(|t| t.tool_id.clone())
                .collect(),
            interaction_count: self.interaction_count,
        }
    }
}

/// Condensed view of a conversation's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    pub last_entity: Option<String>,
    pub recent_entities: Vec<String>,
    pub last_tool: Option<String>,
    pub recent_tools: Vec<String>,
    pub interaction_count: u64,
}
