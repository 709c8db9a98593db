// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation and message store with failure injection.
//!
//! `MemoryStore` implements both persistence traits over plain vectors
//! and publishes inserts and status changes on per-conversation
//! broadcast feeds, mirroring the SQLite adapter's observable behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use stonegate_core::{
    ChatError, Conversation, ConversationEvent, ConversationId, ConversationStatus,
    ConversationStore, MessageId, MessageStore, NewConversation, NewMessage, RefCode,
    SenderRole, StoredMessage,
};

fn storage_error(detail: &str) -> ChatError {
    ChatError::Storage {
        source: Box::new(std::io::Error::other(detail.to_string())),
    }
}

/// In-memory store for deterministic tests.
///
/// Failure injection:
/// - [`conflict_next_creates`](Self::conflict_next_creates) forces the
///   next N conversation creates to report a code conflict
/// - [`fail_next_creates`](Self::fail_next_creates) forces storage
///   failures on conversation creation
/// - [`fail_next_message_creates`](Self::fail_next_message_creates)
///   forces message submissions to fail
/// - [`fail_fetches`](Self::fail_fetches) makes every message-list
///   fetch fail until reset
#[derive(Default)]
pub struct MemoryStore {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<StoredMessage>>,
    feeds: Mutex<HashMap<String, broadcast::Sender<ConversationEvent>>>,
    counter: AtomicU64,
    conflict_creates: AtomicU32,
    fail_creates: AtomicU32,
    fail_message_creates: AtomicU32,
    fail_fetches: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conflict_next_creates(&self, n: u32) {
        self.conflict_creates.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_creates(&self, n: u32) {
        self.fail_creates.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_message_creates(&self, n: u32) {
        self.fail_message_creates.store(n, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Total messages across all conversations.
    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn take_injected(&self, counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn feed(&self, id: &ConversationId) -> broadcast::Sender<ConversationEvent> {
        self.feeds
            .lock()
            .unwrap()
            .entry(id.0.clone())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    fn publish(&self, id: &ConversationId, event: ConversationEvent) {
        if let Some(tx) = self.feeds.lock().unwrap().get(&id.0) {
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, new: &NewConversation) -> Result<Conversation, ChatError> {
        if self.take_injected(&self.conflict_creates) {
            return Err(ChatError::CodeConflict {
                code: new.ref_code.as_str().to_string(),
            });
        }
        if self.take_injected(&self.fail_creates) {
            return Err(storage_error("injected create failure"));
        }

        let mut conversations = self.conversations.lock().unwrap();
        if conversations.iter().any(|c| c.ref_code == new.ref_code) {
            return Err(ChatError::CodeConflict {
                code: new.ref_code.as_str().to_string(),
            });
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: ConversationId(format!("c-{}", uuid::Uuid::new_v4())),
            ref_code: new.ref_code.clone(),
            customer_name: new.customer_name.clone(),
            customer_phone: new.customer_phone.clone(),
            status: ConversationStatus::Open,
            created_at: now,
            last_activity_at: now,
            last_message_preview: None,
        };
        conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn get_by_ref_code(&self, code: &RefCode) -> Result<Option<Conversation>, ChatError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.ref_code == code)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<Conversation, ChatError> {
        let updated = {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .iter_mut()
                .find(|c| &c.id == id)
                .ok_or_else(|| ChatError::Internal(format!("conversation {} not found", id.0)))?;
            conversation.status = status;
            conversation.clone()
        };
        self.publish(id, ConversationEvent::StatusChanged(updated.status));
        Ok(updated)
    }

    async fn list(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ChatError> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(conversations)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: &NewMessage) -> Result<StoredMessage, ChatError> {
        message.validate()?;
        if self.take_injected(&self.fail_message_creates) {
            return Err(storage_error("injected send failure"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let stored = StoredMessage {
            id: MessageId(format!("m-{n}")),
            conversation_id: message.conversation_id.clone(),
            ref_code: message.ref_code.clone(),
            sender_role: message.sender_role,
            sender_name: message.sender_name.clone(),
            text: message.text.clone(),
            media: message.media.clone(),
            created_at: Utc::now(),
            read: false,
        };

        {
            let mut messages = self.messages.lock().unwrap();
            messages.push(stored.clone());
        }
        {
            let mut conversations = self.conversations.lock().unwrap();
            if let Some(conversation) = conversations
                .iter_mut()
                .find(|c| c.id == stored.conversation_id)
            {
                conversation.last_activity_at = stored.created_at;
                conversation.last_message_preview = Some(stored.preview());
            }
        }
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
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(storage_error("injected fetch failure"));
        }
        let mut messages: Vec<StoredMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.conversation_id == id)
            .cloned()
            .collect();
        // Insertion order already matches arrival; the stable sort keeps
        // it for equal timestamps.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_read(
        &self,
        id: &ConversationId,
        sender_role: SenderRole,
    ) -> Result<(), ChatError> {
        let mut messages = self.messages.lock().unwrap();
        for message in messages
            .iter_mut()
            .filter(|m| &m.conversation_id == id && m.sender_role == sender_role)
        {
            message.read = true;
        }
        Ok(())
    }

    fn subscribe(&self, id: &ConversationId) -> broadcast::Receiver<ConversationEvent> {
        self.feed(id).subscribe()
    }
}
