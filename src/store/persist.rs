//! Local durable storage and store snapshots
//!
//! The whole `RootState` is written as one JSON document under a fixed,
//! versioned key. Storage backends are key/value like browser local storage:
//!
//! ```text
//! <data_dir>/
//! ├── persist_root.json   # {"version": 1, "state": {...}}
//! └── auth_user.json      # signed-in user
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

use super::RootState;

/// Key the root snapshot is stored under
pub const PERSIST_KEY: &str = "persist:root";

/// Snapshot format version; a mismatch discards the snapshot
pub const PERSIST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value storage for small JSON documents
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove_item(&self, key: &str) -> Result<(), PersistError>;
}

// =============================================================================
// File Storage
// =============================================================================

/// One file per key inside a directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the key files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves half a snapshot
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-memory storage for tests
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistError> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// Persistor
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<S> {
    version: u32,
    state: S,
}

/// Saves and restores `RootState` snapshots
#[derive(Clone)]
pub struct Persistor {
    storage: Arc<dyn LocalStorage>,
    key: String,
    version: u32,
}

impl Persistor {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            key: PERSIST_KEY.to_string(),
            version: PERSIST_VERSION,
        }
    }

    /// Override the snapshot version (for migration tests)
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Write the whole state
    pub fn save(&self, state: &RootState) -> Result<(), PersistError> {
        let raw = serde_json::to_string(&Snapshot {
            version: self.version,
            state,
        })?;
        self.storage.set_item(&self.key, &raw)
    }

    /// Restore the last snapshot.
    ///
    /// Missing, unreadable or version-mismatched snapshots yield the default
    /// state; only storage I/O failures are errors.
    pub fn load(&self) -> Result<RootState, PersistError> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            debug!(key = %self.key, "no snapshot, starting fresh");
            return Ok(RootState::default());
        };

        let snapshot: Snapshot<RootState> = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "discarding unreadable snapshot");
                return Ok(RootState::default());
            }
        };

        if snapshot.version != self.version {
            warn!(
                found = snapshot.version,
                expected = self.version,
                "discarding snapshot from another version"
            );
            return Ok(RootState::default());
        }

        Ok(snapshot.state)
    }

    /// Drop the stored snapshot
    pub fn purge(&self) -> Result<(), PersistError> {
        self.storage.remove_item(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Action, ModalAction, SubscriptionAction};
    use crate::models::find_plan;

    #[test]
    fn test_memory_round_trip() {
        let persistor = Persistor::new(Arc::new(MemoryStorage::new()));

        let mut state = RootState::default();
        state.reduce(&Action::Modal(ModalAction::ToggleMuteVideo));
        state.reduce(&Action::Subscription(SubscriptionAction::SetPlan(
            find_plan("premium").unwrap(),
        )));

        persistor.save(&state).unwrap();
        assert_eq!(persistor.load().unwrap(), state);
    }

    #[test]
    fn test_missing_snapshot_is_default() {
        let persistor = Persistor::new(Arc::new(MemoryStorage::new()));
        assert_eq!(persistor.load().unwrap(), RootState::default());
    }

    #[test]
    fn test_garbage_snapshot_is_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(PERSIST_KEY, "{not json").unwrap();
        let persistor = Persistor::new(storage);
        assert_eq!(persistor.load().unwrap(), RootState::default());
    }

    #[test]
    fn test_file_storage_keys_map_to_files() {
        let storage = FileStorage::new("/tmp/flix");
        assert_eq!(
            storage.path_for("persist:root"),
            PathBuf::from("/tmp/flix/persist_root.json")
        );
        assert_eq!(
            storage.path_for("auth:user"),
            PathBuf::from("/tmp/flix/auth_user.json")
        );
    }
}
