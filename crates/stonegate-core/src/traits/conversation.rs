// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation persistence trait.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{Conversation, ConversationId, ConversationStatus, NewConversation, RefCode};

/// Persistence collaborator for conversation records.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Inserts a new conversation and returns the stored record with its
    /// server-assigned id, timestamps, and open status.
    ///
    /// Fails with [`ChatError::CodeConflict`] when the reference code is
    /// already taken, so the caller can mint a fresh code and retry.
    async fn create(&self, new: &NewConversation) -> Result<Conversation, ChatError>;

    /// Looks up a conversation by exact (normalized) reference code.
    async fn get_by_ref_code(&self, code: &RefCode) -> Result<Option<Conversation>, ChatError>;

    /// Updates the lifecycle status and returns the updated record.
    async fn update_status(
        &self,
        id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<Conversation, ChatError>;

    /// Lists conversations, optionally filtered by status, ordered by
    /// last activity descending. Staff console listing.
    async fn list(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ChatError>;
}
