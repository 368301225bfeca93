//! Store of conversation contexts, one per conversation id
//!
//! Lock layout: an outer `RwLock` guards the id-to-context map, and each
//! context sits behind its own `Mutex`. Turns for different conversations
//! never contend on a shared lock; two turns for the same conversation
//! serialize on that conversation's mutex alone.

use crate::context::{ContextCaps, ConversationContext};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Store of per-conversation contexts
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: RwLock<HashMap<String, Arc<Mutex<ConversationContext>>>>,
    caps: ContextCaps,
}

impl ContextStore {
    /// Create an empty store with default window bounds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store applying explicit window bounds to every context
    pub fn with_caps(caps: ContextCaps) -> Self {
        Self {
            contexts: RwLock::default(),
            caps,
        }
    }

    /// Get the context for a conversation, creating an empty one on first use
    ///
    /// Idempotent: repeated calls with the same id return the same context.
    pub fn get_or_create(&self, conversation_id: &str) -> Arc<Mutex<ConversationContext>> {
        if let Some(ctx) = self
            .contexts
            .read()
            .expect("context store lock poisoned")
            .get(conversation_id)
        {
            return Arc::clone(ctx);
        }

        let mut contexts = self.contexts.write().expect("context store lock poisoned");
        Arc::clone(
            contexts
                .entry(conversation_id.to_string())
                .or_insert_with(|| {
                    tracing::debug!(conversation_id, "Creating conversation context");
                    Arc::new(Mutex::new(ConversationContext::with_caps(
                        conversation_id,
                        self.caps,
                    )))
                }),
        )
    }

    /// Clone the current state of a conversation's context
    ///
    /// The read side of a turn operates on this immutable snapshot, which
    /// keeps selection deterministic even if another turn for the same
    /// conversation lands concurrently.
    pub fn snapshot(&self, conversation_id: &str) -> ConversationContext {
        let ctx = self.get_or_create(conversation_id);
        let guard = ctx.lock().expect("conversation lock poisoned");
        guard.clone()
    }

    /// Record one completed turn into a conversation's context
    ///
    /// All window updates happen under the conversation's mutex in a single
    /// critical section: a turn cancelled before this call leaves the context
    /// exactly in its pre-turn state, and no partial write is observable.
    pub fn record_turn(
        &self,
        conversation_id: &str,
        query: &str,
        entities: &[String],
        tools: &[(String, Map<String, serde_json::Value>)],
    ) {
        let ctx = self.get_or_create(conversation_id);
        let mut guard = ctx.lock().expect("conversation lock poisoned");
        guard.record_turn(query, entities, tools);
        tracing::debug!(
            conversation_id,
            entities = entities.len(),
            tools = tools.len(),
            "Recorded turn"
        );
    }

    /// Remove a conversation's context
    ///
    /// Called by the external storage layer when its TTL policy fires.
    pub fn evict(&self, conversation_id: &str) -> bool {
        self.contexts
            .write()
            .expect("context store lock poisoned")
            .remove(conversation_id)
            .is_some()
    }

    /// Number of live conversations
    pub fn len(&self) -> usize {
        self.contexts
            .read()
            .expect("context store lock poisoned")
            .len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_idempotent() {
        let store = ContextStore::new();
        let first = store.get_or_create("conv-1");
        let second = store.get_or_create("conv-1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_caps_apply_to_new_contexts() {
        let store = ContextStore::with_caps(ContextCaps {
            messages: 1,
            entities: 1,
            tools: 1,
        });
        store.record_turn("conv-1", "a", &["AAPL".to_string()], &[]);
        store.record_turn("conv-1", "b", &["MSFT".to_string()], &[]);

        let ctx = store.snapshot("conv-1");
        assert_eq!(ctx.entities, vec!["MSFT".to_string()]);
        assert_eq!(ctx.message_window.len(), 1);
    }

    #[test]
    fn test_conversations_are_independent() {
        let store = ContextStore::new();
        store.record_turn("conv-1", "Analyze AAPL", &["AAPL".to_string()], &[]);
        store.record_turn("conv-2", "Analyze TSLA", &["TSLA".to_string()], &[]);

        assert_eq!(store.snapshot("conv-1").last_entity(), Some("AAPL"));
        assert_eq!(store.snapshot("conv-2").last_entity(), Some("TSLA"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = ContextStore::new();
        store.record_turn("conv-1", "Analyze AAPL", &["AAPL".to_string()], &[]);

        let snapshot = store.snapshot("conv-1");
        store.record_turn("conv-1", "now MSFT", &["MSFT".to_string()], &[]);

        assert_eq!(snapshot.last_entity(), Some("AAPL"));
        assert_eq!(store.snapshot("conv-1").last_entity(), Some("MSFT"));
    }

    #[test]
    fn test_evict() {
        let store = ContextStore::new();
        store.record_turn("conv-1", "Analyze AAPL", &["AAPL".to_string()], &[]);

        assert!(store.evict("conv-1"));
        assert!(!store.evict("conv-1"));
        assert!(store.snapshot("conv-1").entities.is_empty());
    }

    #[test]
    fn test_concurrent_turns_on_different_conversations() {
        let store = Arc::new(ContextStore::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let id = format!("conv-{i}");
                for turn in 0..20 {
                    store.record_turn(&id, &format!("query {turn}"), &[format!("SYM{i}")], &[]);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8);
        for i in 0..8 {
            let ctx = store.snapshot(&format!("conv-{i}"));
            assert_eq!(ctx.interaction_count, 20);
            assert_eq!(ctx.last_entity(), Some(format!("SYM{i}").as_str()));
        }
    }
}
