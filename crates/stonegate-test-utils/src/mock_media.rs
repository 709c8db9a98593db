// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory object store with captured uploads and failure injection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use stonegate_core::{ChatError, ObjectStore};

/// One captured upload: key, body, content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedUpload {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// [`ObjectStore`] that records uploads instead of persisting them.
pub struct MemoryObjectStore {
    base_url: String,
    uploads: Mutex<Vec<CapturedUpload>>,
    fail: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            uploads: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every upload fail until reset.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<CapturedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ChatError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChatError::Attach {
                message: "injected upload failure".to_string(),
                source: None,
            });
        }
        self.uploads.lock().unwrap().push(CapturedUpload {
            key: key.to_string(),
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
