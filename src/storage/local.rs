//! Local filesystem state store.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::pipeline::IngestableRecord;
use crate::storage::{StateStore, SyncState};

const MARKERS_KEY: &str = "markers.json";

/// Local filesystem state store backend.
#[derive(Clone)]
pub struct LocalStateStore {
    root_dir: PathBuf,
}

impl LocalStateStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Relative key of a document record file.
    fn record_key(id: &str) -> String {
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        format!("docs/{safe}.json")
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load_state(&self) -> Result<SyncState> {
        match self.read_json::<SyncState>(MARKERS_KEY).await? {
            Some(state) => Ok(state),
            None => {
                log::debug!("No {MARKERS_KEY} found; starting with empty state");
                Ok(SyncState::default())
            }
        }
    }

    async fn save_state(&self, state: &SyncState) -> Result<()> {
        self.write_json(MARKERS_KEY, state).await
    }

    async fn write_record(&self, record: &IngestableRecord) -> Result<()> {
        self.write_json(&Self::record_key(&record.id), record).await
    }

    async fn remove_record(&self, id: &str) -> Result<()> {
        let path = self.path(&Self::record_key(id));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, Page};
    use crate::pipeline::assemble;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_record() -> IngestableRecord {
        let page = Page::parse(&json!({
            "id": "42",
            "type": "page",
            "title": "Release Notes",
            "space": { "key": "ENG" },
            "body": { "view": { "value": "<p>hello</p>" } }
        }))
        .unwrap();
        assemble(&ContentItem::Page(page), Utc::now())
    }

    #[tokio::test]
    async fn test_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());

        let mut state = SyncState::default();
        state.set_marker("42", "2020-01-01T00:00:00Z");
        store.save_state(&state).await.unwrap();

        let loaded = store.load_state().await.unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.marker("42"), Some("2020-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_load_missing_state_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());

        let state = store.load_state().await.unwrap();
        assert!(state.markers.is_empty());
    }

    #[tokio::test]
    async fn test_write_and_remove_record() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());

        let record = sample_record();
        store.write_record(&record).await.unwrap();
        assert!(tmp.path().join("docs/42.json").exists());

        store.remove_record("42").await.unwrap();
        assert!(!tmp.path().join("docs/42.json").exists());

        // Removing an absent record is not an error.
        store.remove_record("42").await.unwrap();
    }

    #[tokio::test]
    async fn test_record_key_sanitizes_hostile_ids() {
        assert_eq!(
            LocalStateStore::record_key("../../etc/passwd"),
            "docs/.._.._etc_passwd.json"
        );
    }
}
