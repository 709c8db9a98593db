// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary object storage trait for attached media.

use async_trait::async_trait;

use crate::error::ChatError;

/// Upload-by-key object storage that serves uploads at a public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`. Overwrites are not expected: keys are
    /// minted with a collision-resistant suffix by the media pipeline.
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str)
        -> Result<(), ChatError>;

    /// The publicly fetchable URL for a stored key.
    fn public_url(&self, key: &str) -> String;
}
