//! Session persistence
//!
//! A session is an exported [`SessionSnapshot`] stored under an id so a
//! conversation can be resumed later. Stores never interpret the snapshot.

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::domain::SessionSnapshot;

/// Errors from session stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid session id: {0:?}")]
    InvalidId(String),
}

/// Storage for exported conversation snapshots, keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save `snapshot` under `id`, replacing any previous one
    async fn save(&self, id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

    /// Load the snapshot saved under `id`, or `None` if there is none
    async fn load(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError>;

    /// Ids of all saved sessions, sorted
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Reject ids that are empty or could escape the store directory
pub(crate) fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("0192b7c4-session").is_ok());
        assert!(validate_id("rate-limiting").is_ok());
        assert!(matches!(validate_id(""), Err(StoreError::InvalidId(_))));
        assert!(validate_id("  ").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a\\b").is_err());
    }

    #[test]
    fn test_invalid_id_message() {
        let err = StoreError::InvalidId("a/b".to_string());
        assert_eq!(err.to_string(), "Invalid session id: \"a/b\"");
    }
}
