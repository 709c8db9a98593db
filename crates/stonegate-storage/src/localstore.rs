// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file implementation of the device-local key-value store.
//!
//! Backs the session store and history ledger on a device profile the
//! way browser local storage backs the widget: a flat string map with
//! last-write-wins semantics and no transactional guarantees.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use stonegate_core::LocalStore;

/// File-backed [`LocalStore`].
///
/// The whole map is loaded on open and rewritten on every mutation.
/// Write failures are logged and swallowed; the in-memory view stays
/// authoritative for the process lifetime.
pub struct FileStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing content if present.
    ///
    /// An unreadable or corrupt file starts the store empty rather than
    /// failing: local history is a convenience, not a system of record.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "local store corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            map: Mutex::new(map),
        }
    }

    fn persist(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(path = %self.path.display(), error = %e, "local store dir create failed");
                    return;
                }
            }
        }
        match serde_json::to_vec_pretty(map) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    warn!(path = %self.path.display(), error = %e, "local store write failed");
                }
            }
            Err(e) => {
                warn!(error = %e, "local store serialize failed");
            }
        }
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .expect("local store poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.map.lock().expect("local store poisoned");
        map.insert(key.to_string(), value.to_string());
        self.persist(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.lock().expect("local store poisoned");
        map.remove(key);
        self.persist(&map);
    }
}
