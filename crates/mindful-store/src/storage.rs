use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;

/// Flat string key/value storage, the client's equivalent of browser
/// persistent storage.
///
/// Access is synchronous. Implementations must be safe to share between
/// tasks but no cross-process coordination is attempted.
pub trait Storage: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &str;
}

fn lock<'a>(
    entries: &'a Mutex<BTreeMap<String, String>>,
) -> Result<MutexGuard<'a, BTreeMap<String, String>>, StoreError> {
    entries
        .lock()
        .map_err(|_| StoreError::Unavailable("storage lock poisoned".into()))
}

/// JSON file backend.
///
/// The whole map is loaded on open and rewritten on every mutation:
/// ```text
/// { "access_token": "...", "theme": "dark", ... }
/// ```
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file is an empty store; the file is only created on the
    /// first write.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            path = %path.display(),
            keys = entries.len(),
            "Opened file storage"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Default location: `~/.config/mindful/storage.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("mindful")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;

        // Write to a sibling file and rename so a crash never leaves half a map.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = lock(&self.entries)?;
        Ok(entries.get(key).cloned())
    }

    // The in-memory map only changes once the new contents are on disk.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// In-memory backend for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the store with known values.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Keys currently held, sorted.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = lock(&self.entries)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries)?;
        entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_path() -> (PathBuf, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        (path, dir)
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("theme").unwrap(), None);

        storage.set("theme", "dark").unwrap();
        assert_eq!(storage.get("theme").unwrap(), Some("dark".into()));

        storage.remove("theme").unwrap();
        assert_eq!(storage.get("theme").unwrap(), None);

        // Removing again is a no-op
        storage.remove("theme").unwrap();
    }

    #[test]
    fn memory_storage_with_entries() {
        let storage = MemoryStorage::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(storage.keys(), vec!["a", "b"]);
        assert_eq!(storage.get("b").unwrap(), Some("2".into()));
    }

    #[test]
    fn file_storage_missing_file_is_empty() {
        let (path, _dir) = temp_path();
        let storage = FileStorage::open(path.clone()).unwrap();
        assert_eq!(storage.get("anything").unwrap(), None);
        assert!(!path.exists(), "open must not create the file");
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let (path, _dir) = temp_path();

        let storage = FileStorage::open(path.clone()).unwrap();
        storage.set("access_token", "tok-1").unwrap();
        storage.set("locale", "en").unwrap();
        storage.remove("locale").unwrap();
        drop(storage);

        let reopened = FileStorage::open(path).unwrap();
        assert_eq!(reopened.get("access_token").unwrap(), Some("tok-1".into()));
        assert_eq!(reopened.get("locale").unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_corrupt_file() {
        let (path, _dir) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let result = FileStorage::open(path);
        assert!(matches!(result, Err(StoreError::Json(_))));
    }

    #[test]
    fn file_storage_empty_file_is_empty_store() {
        let (path, _dir) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();

        let storage = FileStorage::open(path).unwrap();
        assert_eq!(storage.get("theme").unwrap(), None);
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "regular file").unwrap();

        let storage = FileStorage::open(blocker.join("storage.json")).unwrap();
        assert!(storage.set("access_token", "tok").is_err());
        assert_eq!(storage.get("access_token").unwrap(), None);
    }

    #[test]
    fn failed_remove_keeps_value() {
        let (path, _dir) = temp_path();
        let storage = FileStorage::open(path.clone()).unwrap();
        storage.set("access_token", "tok").unwrap();

        // Swap the parent directory for a regular file so the rewrite fails.
        let parent = path.parent().unwrap();
        std::fs::remove_dir_all(parent).unwrap();
        std::fs::write(parent, "regular file").unwrap();

        assert!(storage.remove("access_token").is_err());
        assert_eq!(storage.get("access_token").unwrap(), Some("tok".into()));
    }

    #[test]
    fn backend_names() {
        let (path, _dir) = temp_path();
        assert_eq!(FileStorage::open(path).unwrap().backend_name(), "file");
        assert_eq!(MemoryStorage::new().backend_name(), "memory");
    }
}
