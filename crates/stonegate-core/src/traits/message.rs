// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence and change-feed trait.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ChatError;
use crate::types::{ConversationEvent, ConversationId, NewMessage, SenderRole, StoredMessage};

/// Persistence collaborator for messages, with an optional push feed.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts a message; the store assigns the durable id and timestamp.
    async fn create(&self, message: &NewMessage) -> Result<StoredMessage, ChatError>;

    /// All messages of a conversation, timestamp ascending.
    async fn list_by_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, ChatError>;

    /// Marks all messages authored by `sender_role` in the conversation
    /// as read. Used by the staff console when opening a conversation.
    async fn mark_read(
        &self,
        id: &ConversationId,
        sender_role: SenderRole,
    ) -> Result<(), ChatError>;

    /// Subscribes to the conversation's change feed.
    ///
    /// Every insert and status change is published as a
    /// [`ConversationEvent`]. Push-mode delivery consumes this; poll-mode
    /// deployments simply never call it.
    fn subscribe(&self, id: &ConversationId) -> broadcast::Receiver<ConversationEvent>;
}
