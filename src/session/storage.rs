//! Key/value persistence for the session, in the manner of browser local storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

/// Errors raised while reading or writing persisted session data.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("Could not access session storage at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The backing file does not hold a JSON object of strings.
    #[error("Session storage at {path} is corrupted: {source}")]
    Corrupted {
        /// File being read.
        path: PathBuf,
        /// Underlying decoding failure.
        source: serde_json::Error,
    },
    /// A lock guarding the storage was poisoned by a panicking writer.
    #[error("Session storage lock was poisoned.")]
    Poisoned,
}

/// A string key/value store.
///
/// Implementations must be safe to share between tasks: the API client reads
/// the access token on every request and rewrites it on rotation.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Volatile storage, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

/// Storage persisted as a flat JSON object in a single file.
///
/// The whole file is rewritten on each change; the data held here is a few
/// short strings.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Opens the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let items = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StorageError::Corrupted {
                    path: path.clone(),
                    source,
                })?
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(items).map_err(|source| {
            StorageError::Corrupted {
                path: self.path.clone(),
                source,
            }
        })?;

        std::fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;

        // The file is written first; memory only changes once it holds the new value.
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;

        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;

        if !items.contains_key(key) {
            return Ok(());
        }

        let mut next = items.clone();
        next.remove(key);
        self.flush(&next)?;

        *items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fanstore-storage-{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set_item("token", "abc").unwrap();
        assert_eq!(storage.get_item("token").as_deref(), Some("abc"));

        storage.remove_item("token").unwrap();
        assert_eq!(storage.get_item("token"), None);

        // removing twice is fine
        storage.remove_item("token").unwrap();
    }

    #[test]
    fn file_storage_survives_reopen() {
        let path = scratch_file("reopen.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("refreshToken", "r-1").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("refreshToken").as_deref(), Some("r-1"));

        reopened.remove_item("refreshToken").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("refreshToken"), None);
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let path = scratch_file("unwritable.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("token", "old").unwrap();

        // A directory where the file should be makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(storage.set_item("token", "new"), Err(StorageError::Io { .. })));
        assert_eq!(storage.get_item("token").as_deref(), Some("old"));

        assert!(storage.remove_item("token").is_err());
        assert_eq!(storage.get_item("token").as_deref(), Some("old"));

        std::fs::remove_dir(&path).unwrap();
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let path = scratch_file("garbage.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStorage::open(&path),
            Err(StorageError::Corrupted { .. })
        ));
    }

    #[test]
    fn file_storage_treats_empty_file_as_empty() {
        let path = scratch_file("empty.json");
        std::fs::write(&path, "").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("token"), None);
    }
}
