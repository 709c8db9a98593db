// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem implementation of the object store.
//!
//! Writes uploads under a root directory and serves them from a
//! configured base URL (a static file server or CDN fronting the same
//! directory in deployment).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use stonegate_core::{ChatError, ObjectStore};

/// Filesystem-backed [`ObjectStore`].
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, ChatError> {
        // Keys are minted by the pipeline; still refuse anything that
        // could escape the root.
        let valid = !key.is_empty()
            && !key.starts_with('/')
            && Path::new(key)
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !valid {
            return Err(ChatError::Attach {
                message: format!("invalid object key `{key}`"),
                source: None,
            });
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ChatError> {
        if bytes.is_empty() {
            // A zero-byte capture (e.g. an instantly stopped voice note)
            // fails here rather than producing an unplayable attachment.
            return Err(ChatError::Attach {
                message: "empty object body".to_string(),
                source: None,
            });
        }

        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ChatError::Attach {
                    message: format!("failed to create {}", parent.display()),
                    source: Some(Box::new(e)),
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ChatError::Attach {
                message: format!("failed to write {}", path.display()),
                source: Some(Box::new(e)),
            })?;

        debug!(key, size = bytes.len(), content_type, "object stored");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
