//! Durable snapshots of the workspace.
//!
//! Storage is a plain string key/value store. The whole workspace is
//! serialized to JSON under one key and overwritten on every save; there
//! is no merging and no partial write.
//!
//! ## Snapshot format
//!
//! ```json
//! {
//!   "name": "My Learning Workspace",
//!   "folders": [{ "id": "…", "name": "src", "parentId": null, "lastModified": "…" }],
//!   "files": [{ "id": "…", "name": "welcome.py", "content": "…", "language": "python",
//!               "lastModified": "…", "folderId": null }],
//!   "activeFileId": "…"
//! }
//! ```

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::workspace::{FileDefaults, Workspace};
use crate::CoreResult;

/// A process-external key/value store.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Write beside the target, flush to disk, then rename over it so
        // readers never see a half-written snapshot. Each writer gets its
        // own temp file.
        let path = self.path_for(key);
        let tmp = self
            .dir
            .join(format!(".{key}.json.{}.tmp", uuid::Uuid::new_v4().simple()));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage. Clones share the same entries, which lets tests
/// simulate a reload by opening a second session on a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Reads and writes whole-workspace snapshots under a single key.
pub struct Persistence {
    storage: Box<dyn Storage>,
    key: String,
}

impl Persistence {
    /// Creates a persistence adapter over `storage`.
    pub fn new(storage: impl Storage + 'static, key: impl Into<String>) -> Self {
        Self {
            storage: Box::new(storage),
            key: key.into(),
        }
    }

    /// Loads the saved workspace.
    ///
    /// Missing, unreadable, or malformed snapshots all yield `None`; the
    /// caller is expected to start from a fresh workspace. A snapshot that
    /// parses is repaired (orphans moved to root, empty workspace given a
    /// welcome file, dangling active pointer reselected) before use.
    pub fn load(&self, defaults: FileDefaults) -> Option<Workspace> {
        let text = match self.storage.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!("No saved workspace under {}", self.key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read saved workspace: {}", e);
                return None;
            }
        };

        let mut workspace: Workspace = match serde_json::from_str(&text) {
            Ok(workspace) => workspace,
            Err(e) => {
                tracing::warn!("Discarding malformed workspace snapshot: {}", e);
                return None;
            }
        };

        workspace.set_defaults(defaults);
        let moved = workspace.adopt_orphans();
        if moved > 0 {
            tracing::warn!("Moved {} orphaned entries to the workspace root", moved);
        }
        workspace.reconcile();

        tracing::info!(
            "Loaded workspace {:?} ({} files, {} folders)",
            workspace.name(),
            workspace.files().len(),
            workspace.folders().len()
        );
        Some(workspace)
    }

    /// Overwrites the saved snapshot with `workspace`.
    pub fn save(&self, workspace: &Workspace) -> CoreResult<()> {
        let json = serde_json::to_string(workspace)?;
        self.storage.set(&self.key, &json)?;
        tracing::trace!("Saved workspace snapshot ({} bytes)", json.len());
        Ok(())
    }

    /// Deletes the saved snapshot.
    pub fn clear(&self) -> CoreResult<()> {
        self.storage.remove(&self.key)
    }
}
