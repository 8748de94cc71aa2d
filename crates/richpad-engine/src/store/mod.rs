//! Persistence adapter: a small key-value store holding the serialized
//! document under a single well-known key. The filesystem implementation is
//! the local-storage rendition, one file per key under a root directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::document::Snapshot;

/// The one key the editor persists under.
pub const CONTENT_KEY: &str = "content";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt document under key '{key}': {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("Failed to encode document: {0}")]
    Encode(serde_json::Error),
}

/// String key-value storage. Implementations must not interpret values.
pub trait ContentStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.root.join(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl ContentStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the persisted document; an absent key falls back to the bundled
/// default document.
pub fn load_document(store: &dyn ContentStore) -> Result<Snapshot, StoreError> {
    match store.read(CONTENT_KEY)? {
        Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
            key: CONTENT_KEY.to_string(),
            source,
        }),
        None => Ok(Snapshot::default_document()),
    }
}

/// Serialize and persist the document under the content key.
pub fn save_document(store: &dyn ContentStore, snapshot: &Snapshot) -> Result<(), StoreError> {
    let json = serde_json::to_string(snapshot).map_err(StoreError::Encode)?;
    store.write(CONTENT_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_falls_back_to_default_document() {
        let store = MemoryStore::default();
        let snapshot = load_document(&store).unwrap();
        assert_eq!(snapshot, Snapshot::default_document());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = MemoryStore::default();
        let snapshot = Snapshot::from_paragraphs(&["one", "two"]);

        save_document(&store, &snapshot).unwrap();
        let loaded = load_document(&store).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_corrupt_payload_surfaces_as_error() {
        let store = MemoryStore::default();
        store.write(CONTENT_KEY, "{ not json").unwrap();

        let result = load_document(&store);

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::from_paragraphs(&["persisted"]);

        {
            let store = FileStore::new(dir.path());
            save_document(&store, &snapshot).unwrap();
        }

        let store = FileStore::new(dir.path());
        let loaded = load_document(&store).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_file_store_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.read("content").unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_root_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/storage"));

        store.write(CONTENT_KEY, "payload").unwrap();

        assert_eq!(store.read(CONTENT_KEY).unwrap(), Some("payload".to_string()));
    }
}
