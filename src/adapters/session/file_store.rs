use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{BookingError, Result};
use crate::ports::session::TokenStore;

/// Token store persisted as a flat JSON object, rewritten on every change.
pub struct FileTokenStore {
    path: PathBuf,
    inner: RwLock<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                BookingError::Config(format!(
                    "failed to read token file {}: {e}",
                    path.display()
                ))
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!(path = %path.display(), "Token file not found, starting empty");
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn update(&self, key: &str, f: impl FnOnce(&mut BTreeMap<String, String>)) {
        let Ok(mut entries) = self.inner.write() else {
            warn!(key, "Token store lock poisoned, skipping write");
            return;
        };
        f(&mut entries);
        if let Err(e) = self.persist(&entries) {
            warn!(key, path = %self.path.display(), error = %e, "Failed to persist token file");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.update(key, |m| {
            m.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(key, |m| {
            m.remove(key);
        });
    }
}
