//! Session-scoped key/value storage.
//!
//! The client persists exactly two entries (session id and message log
//! snapshot) into a storage scope private to one session. Two media are
//! provided:
//!
//! ```text
//! MemoryStorage   in-process map, lives as long as the host process
//! FileStorage     <scope_dir>/<key>.json, survives restarts
//! ```
//!
//! A medium that fails the availability probe is not used at all; the
//! client then runs in degraded (ephemeral) mode.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};

/// Key written and removed by [`probe`]
pub const PROBE_KEY: &str = "__storage_probe__";

/// A string key/value medium scoped to one chat session
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> ChatResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> ChatResult<()>;
    fn remove_item(&self, key: &str) -> ChatResult<()>;
}

/// Shared handle to a storage medium
pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Check that a medium accepts writes. Returns the medium when usable.
pub fn probe(storage: SharedStorage) -> Option<SharedStorage> {
    let result = storage
        .set_item(PROBE_KEY, "1")
        .and_then(|_| storage.remove_item(PROBE_KEY));

    match result {
        Ok(()) => Some(storage),
        Err(e) => {
            warn!("Storage unavailable, running without persistence: {}", e);
            None
        }
    }
}

/// In-memory storage scope
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> ChatResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ChatResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ChatResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Convert a storage key into a safe file stem
fn slugify(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Directory-backed storage scope
#[derive(Clone, Debug)]
pub struct FileStorage {
    scope_dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage scope directory
    pub fn open(scope_dir: impl AsRef<Path>) -> ChatResult<Self> {
        let scope_dir = scope_dir.as_ref().to_path_buf();
        fs::create_dir_all(&scope_dir).map_err(|e| {
            ChatError::Persistence(format!("cannot create {}: {}", scope_dir.display(), e))
        })?;
        debug!("Opened storage scope at {}", scope_dir.display());
        Ok(Self { scope_dir })
    }

    pub fn scope_dir(&self) -> &Path {
        &self.scope_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.scope_dir.join(format!("{}.json", slugify(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> ChatResult<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| ChatError::Persistence(format!("read {}: {}", path.display(), e)))
    }

    fn set_item(&self, key: &str, value: &str) -> ChatResult<()> {
        let path = self.entry_path(key);
        // Write-then-rename so a crash never leaves a half-written snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| ChatError::Persistence(format!("write {}: {}", path.display(), e)))
    }

    fn remove_item(&self, key: &str) -> ChatResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::Persistence(format!(
                "remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
