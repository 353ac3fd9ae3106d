//! In-memory session store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{SessionStore, StoreError, validate_id};
use crate::domain::SessionSnapshot;

/// Session store held in process memory; contents are lost on drop
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        debug!(%id, phase = %snapshot.phase, "MemorySessionStore::save: called");
        validate_id(id)?;
        self.sessions.lock().await.insert(id.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        debug!(%id, "MemorySessionStore::load: called");
        validate_id(id)?;
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConversationPhase, Turn};

    #[tokio::test]
    async fn test_save_load_overwrite() {
        let store = MemorySessionStore::new();
        assert!(store.load("a").await.unwrap().is_none());

        let mut snapshot = SessionSnapshot {
            feature_request: "Add rate limiting".to_string(),
            history: vec![Turn::agent("Which algorithm?")],
            ..Default::default()
        };
        store.save("a", &snapshot).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), Some(snapshot.clone()));

        snapshot.phase = ConversationPhase::AdrGeneration;
        store.save("a", &snapshot).await.unwrap();
        let loaded = store.load("a").await.unwrap().unwrap();
        assert_eq!(loaded.phase, ConversationPhase::AdrGeneration);
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let store = MemorySessionStore::new();
        let snapshot = SessionSnapshot::default();
        store.save("b", &snapshot).await.unwrap();
        store.save("a", &snapshot).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rejects_invalid_id() {
        let store = MemorySessionStore::new();
        let err = store.save("../x", &SessionSnapshot::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
