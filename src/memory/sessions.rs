//! Per-session conversation state.

use super::Conversation;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Session id → conversation. Each conversation sits behind its own async
/// mutex so one session's record/build/clear calls are serialised without
/// blocking other sessions.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Conversation>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session's conversation, creating an empty one if needed.
    pub fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Conversation>> {
        if let Some(existing) = self.sessions.read().get(session_id) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(sessions.entry(session_id.to_string()).or_default())
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Mutex<Conversation>>> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        store
            .get_or_create("a")
            .lock()
            .await
            .record(MessageRole::User, "hello from a");

        assert_eq!(store.get_or_create("a").lock().await.len(), 1);
        assert_eq!(store.get_or_create("b").lock().await.len(), 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        store.get_or_create("a");
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.get("a").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_records_keep_every_turn() {
        let store = SessionStore::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let conversation = store.get_or_create("shared");
                conversation
                    .lock()
                    .await
                    .record(MessageRole::User, format!("m{}", i));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get_or_create("shared").lock().await.len(), 20);
    }
}
