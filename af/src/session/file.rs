//! File-backed session store: one pretty JSON file per session

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use super::{SessionStore, StoreError, validate_id};
use crate::domain::SessionSnapshot;

/// On-disk wrapper around a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    id: String,
    saved_at: DateTime<Utc>,
    snapshot: SessionSnapshot,
}

/// Session store writing `<dir>/<id>.json`
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "FileSessionStore::new: called");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_file(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, id: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        debug!(%id, phase = %snapshot.phase, "FileSessionStore::save: called");
        validate_id(id)?;
        fs::create_dir_all(&self.dir).await?;

        let stored = StoredSession {
            id: id.to_string(),
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        // Written to a temp file and renamed into place
        let path = self.session_file(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        info!(%id, path = %path.display(), "Session saved");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        debug!(%id, "FileSessionStore::load: called");
        validate_id(id)?;

        let path = self.session_file(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "FileSessionStore::load: no session file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&content)?;
        debug!(saved_at = %stored.saved_at, "FileSessionStore::load: loaded");
        Ok(Some(stored.snapshot))
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        debug!(dir = ?self.dir, "FileSessionStore::list: called");
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
