//! JSON file backed store
//!
//! All entries live in one JSON object. Every write rewrites the file through a
//! temporary file in the same directory followed by a rename, so a crash leaves
//! either the old or the new contents.

use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use taleshelf_core::{AppError, KeyValueStore, Result};
use tempfile::NamedTempFile;

/// Durable store persisted as a JSON object of strings
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is an
    /// error; see [`FileStore::open_or_reset`] for the forgiving variant.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path)?;

        log::debug!(
            "Opened store at {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Opens the store, starting empty if the file cannot be used
    ///
    /// The bad file is left in place until the next successful write replaces it.
    pub fn open_or_reset(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::read_entries(&path) {
            Ok(entries) => Self {
                path,
                entries: RwLock::new(entries),
            },
            Err(e) => {
                log::warn!("{}, starting with an empty store", e);
                Self {
                    path,
                    entries: RwLock::new(BTreeMap::new()),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> StorageResult<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path).map_err(|e| StorageError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn try_set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;

        let previous = entries.insert(key.to_string(), value.to_string());

        if let Err(e) = self.write_all(&entries) {
            // Keep memory consistent with disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }

        Ok(())
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| StorageError::WriteError {
                path: dir.clone(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(entries)?;

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| StorageError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        temp_file
            .write_all(json.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| StorageError::WriteError {
                path: self.path.clone(),
                source: e,
            })?;

        temp_file
            .persist(&self.path)
            .map_err(|e| StorageError::WriteError {
                path: self.path.clone(),
                source: e.error,
            })?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.try_set(key, value).map_err(|e| {
            log::warn!("Store write failed for '{}': {}", key, e);
            AppError::PersistenceFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::open(dir.path().join("store.json")).expect("open");
        assert_eq!(store.get("lastPlayedAudio"), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).expect("open");
        store.set("audioSpeed", "1.25").expect("write");
        store.set("playerMode", "mini").expect("write");
        drop(store);

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("audioSpeed").as_deref(), Some("1.25"));
        assert_eq!(reopened.get("playerMode").as_deref(), Some("mini"));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Corrupt { .. })
        ));

        let store = FileStore::open_or_reset(&path);
        assert_eq!(store.get("audioSpeed"), None);
        store.set("audioSpeed", "2").expect("write replaces corrupt file");
        assert!(FileStore::open(&path).is_ok());
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).expect("open");
        store.set("audioTimer", "30").expect("write");

        // A directory where the file should be makes the rename fail
        fs::remove_file(&path).expect("remove");
        fs::create_dir(&path).expect("mkdir");

        let result = store.set("audioTimer", "45");
        assert!(matches!(
            result,
            Err(AppError::PersistenceFailed { ref key, .. }) if key == "audioTimer"
        ));
        assert_eq!(store.get("audioTimer").as_deref(), Some("30"));
    }
}
