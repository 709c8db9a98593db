// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media attachment pipeline.
//!
//! Converts captured bytes (image, video, voice note) into a durable
//! [`MediaRef`] before a message is composed: upload under a
//! collision-resistant key, resolve the public URL. On upload failure no
//! message is created and the capture is discarded by the caller.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use stonegate_core::{ChatError, MediaKind, MediaRef, ObjectStore, RefCode};

const KEY_SUFFIX_LEN: usize = 6;
const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Uploads captures and mints [`MediaRef`]s for message composition.
#[derive(Clone)]
pub struct MediaPipeline {
    store: Arc<dyn ObjectStore>,
    max_upload_bytes: u64,
}

impl MediaPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, max_upload_bytes: u64) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    /// Uploads `bytes` under a key namespaced by the conversation's
    /// reference code and returns the durable media reference.
    pub async fn attach(
        &self,
        ref_code: &RefCode,
        bytes: &[u8],
        kind: MediaKind,
        content_type: &str,
    ) -> Result<MediaRef, ChatError> {
        if bytes.len() as u64 > self.max_upload_bytes {
            return Err(ChatError::Attach {
                message: format!(
                    "upload of {} bytes exceeds the {} byte limit",
                    bytes.len(),
                    self.max_upload_bytes
                ),
                source: None,
            });
        }

        let key = object_key(ref_code, content_type, kind);
        self.store.upload(&key, bytes, content_type).await?;

        let url = self.store.public_url(&key);
        debug!(key = key.as_str(), size = bytes.len(), kind = %kind, "media attached");
        Ok(MediaRef { url, kind })
    }
}

/// Key scheme: `<ref-code>/<millis>-<random>.<ext>`.
///
/// The timestamp plus random suffix keeps concurrent uploads within one
/// conversation from colliding.
fn object_key(ref_code: &RefCode, content_type: &str, kind: MediaKind) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..KEY_SUFFIX_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}/{}-{}.{}",
        ref_code,
        Utc::now().timestamp_millis(),
        suffix,
        extension_for(content_type, kind)
    )
}

fn extension_for(content_type: &str, kind: MediaKind) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/webm" => "weba",
        "audio/mpeg" => "mp3",
        // Unrecognized content type: fall back to a kind-typical extension.
        _ => match kind {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::Audio => "ogg",
        },
    }
}
