// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ConversationStore`] and [`MessageStore`] implementations over SQLite,
//! with per-conversation broadcast feeds for push-mode delivery.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use stonegate_core::{
    ChatError, Conversation, ConversationEvent, ConversationId, ConversationStatus,
    ConversationStore, MessageId, MessageStore, NewConversation, NewMessage, RefCode,
    SenderRole, StoredMessage,
};

use crate::database::Database;
use crate::queries;

/// Feed buffer per conversation. A receiver that falls further behind
/// than this sees a `Lagged` error and should refetch a snapshot.
const FEED_CAPACITY: usize = 64;

/// Timestamps are persisted at microsecond precision; assign them the
/// same way so records round-trip equal.
fn now_stored() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// SQLite-backed conversation and message store.
///
/// Every insert and status change is also published on the affected
/// conversation's broadcast feed, which backs push-mode delivery.
pub struct SqliteStore {
    db: Database,
    feeds: Mutex<HashMap<String, broadcast::Sender<ConversationEvent>>>,
}

impl SqliteStore {
    /// Opens the database at `path` (running migrations) and wraps it.
    pub async fn open(path: &str) -> Result<Self, ChatError> {
        let db = Database::open(path).await?;
        Ok(Self {
            db,
            feeds: Mutex::new(HashMap::new()),
        })
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn feed(&self, id: &ConversationId) -> broadcast::Sender<ConversationEvent> {
        let mut feeds = self.feeds.lock().expect("feed registry poisoned");
        feeds
            .entry(id.0.clone())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .clone()
    }

    fn publish(&self, id: &ConversationId, event: ConversationEvent) {
        let feeds = self.feeds.lock().expect("feed registry poisoned");
        if let Some(tx) = feeds.get(&id.0) {
            // A send error only means no live subscribers.
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create(&self, new: &NewConversation) -> Result<Conversation, ChatError> {
        let now = now_stored();
        let conversation = Conversation {
            id: ConversationId(uuid::Uuid::new_v4().to_string()),
            ref_code: new.ref_code.clone(),
            customer_name: new.customer_name.clone(),
            customer_phone: new.customer_phone.clone(),
            status: ConversationStatus::Open,
            created_at: now,
            last_activity_at: now,
            last_message_preview: None,
        };
        queries::conversations::create_conversation(&self.db, &conversation).await?;
        debug!(
            ref_code = conversation.ref_code.as_str(),
            id = conversation.id.0.as_str(),
            "conversation created"
        );
        Ok(conversation)
    }

    async fn get_by_ref_code(&self, code: &RefCode) -> Result<Option<Conversation>, ChatError> {
        queries::conversations::get_by_ref_code(&self.db, code).await
    }

    async fn update_status(
        &self,
        id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<Conversation, ChatError> {
        let updated = queries::conversations::update_status(&self.db, id, status)
            .await?
            .ok_or_else(|| ChatError::Internal(format!("conversation {} not found", id.0)))?;
        self.publish(id, ConversationEvent::StatusChanged(updated.status));
        debug!(id = id.0.as_str(), status = %updated.status, "conversation status updated");
        Ok(updated)
    }

    async fn list(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ChatError> {
        queries::conversations::list_conversations(&self.db, status).await
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn create(&self, message: &NewMessage) -> Result<StoredMessage, ChatError> {
        message.validate()?;
        let stored = StoredMessage {
            id: MessageId(uuid::Uuid::new_v4().to_string()),
            conversation_id: message.conversation_id.clone(),
            ref_code: message.ref_code.clone(),
            sender_role: message.sender_role,
            sender_name: message.sender_name.clone(),
            text: message.text.clone(),
            media: message.media.clone(),
            created_at: now_stored(),
            read: false,
        };
        queries::messages::insert_message(&self.db, &stored).await?;
        self.publish(
            &stored.conversation_id,
            ConversationEvent::Message(stored.clone()),
        );
        Ok(stored)
    }

    async fn list_by_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, ChatError> {
        queries::messages::list_by_conversation(&self.db, id).await
    }

    async fn mark_read(
        &self,
        id: &ConversationId,
        sender_role: SenderRole,
    ) -> Result<(), ChatError> {
        queries::messages::mark_read(&self.db, id, sender_role).await
    }

    fn subscribe(&self, id: &ConversationId) -> broadcast::Receiver<ConversationEvent> {
        self.feed(id).subscribe()
    }
}
