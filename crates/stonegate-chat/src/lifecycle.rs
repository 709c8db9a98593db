// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle: start, resume, close, reopen.

use std::sync::Arc;

use tracing::{info, warn};

use stonegate_config::ChatConfig;
use stonegate_core::{
    ChatError, Conversation, ConversationId, ConversationStatus, ConversationStore,
    NewConversation, RefCode,
};

use crate::history::{HistoryEntry, HistoryLedger};
use crate::session::SessionStore;

/// Creates and resumes conversations and keeps the session store and
/// history ledger in step with them.
pub struct LifecycleController {
    conversations: Arc<dyn ConversationStore>,
    session: Arc<SessionStore>,
    history: Arc<HistoryLedger>,
    ref_code_prefix: String,
    code_mint_attempts: u32,
}

impl LifecycleController {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        session: Arc<SessionStore>,
        history: Arc<HistoryLedger>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            conversations,
            session,
            history,
            ref_code_prefix: config.ref_code_prefix.clone(),
            code_mint_attempts: config.code_mint_attempts,
        }
    }

    /// Starts a new conversation under a freshly minted reference code.
    ///
    /// Uniqueness is verified at creation time: a code collision is
    /// reported by the store and answered with a regenerated code, up to
    /// the configured attempt bound. On any failure the session state is
    /// left untouched.
    pub async fn start_new(
        &self,
        customer_name: Option<String>,
        customer_phone: Option<String>,
    ) -> Result<Conversation, ChatError> {
        for attempt in 1..=self.code_mint_attempts {
            let new = NewConversation {
                ref_code: RefCode::generate(&self.ref_code_prefix),
                customer_name: customer_name.clone(),
                customer_phone: customer_phone.clone(),
            };
            match self.conversations.create(&new).await {
                Ok(conversation) => {
                    info!(
                        ref_code = conversation.ref_code.as_str(),
                        "conversation started"
                    );
                    self.adopt(&conversation);
                    return Ok(conversation);
                }
                Err(ChatError::CodeConflict { code }) => {
                    warn!(code = code.as_str(), attempt, "reference code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ChatError::Internal(format!(
            "could not mint a unique reference code in {} attempts",
            self.code_mint_attempts
        )))
    }

    /// Resumes a conversation from user-typed input.
    ///
    /// Input is normalized (trim, uppercase) before the exact-match
    /// lookup. Exactly one of: found (session set) or
    /// [`ChatError::NotFound`] with no state change.
    pub async fn resume_by_code(&self, input: &str) -> Result<Conversation, ChatError> {
        let code = RefCode::normalize(input)?;
        match self.conversations.get_by_ref_code(&code).await? {
            Some(conversation) => {
                info!(ref_code = code.as_str(), "conversation resumed");
                self.adopt(&conversation);
                Ok(conversation)
            }
            None => Err(ChatError::NotFound {
                code: code.as_str().to_string(),
            }),
        }
    }

    /// Resumes directly from a history entry, without a network
    /// round-trip. A stale conversation id degrades to an empty or
    /// erroring fetch later, never to a crash here.
    pub fn resume_from_history(&self, entry: &HistoryEntry) {
        self.session
            .set_active(entry.ref_code.clone(), entry.conversation_id.clone());
    }

    /// Staff: closes a conversation to new replies. Closed conversations
    /// are never deleted, only reopenable.
    pub async fn close(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        self.conversations
            .update_status(id, ConversationStatus::Closed)
            .await
    }

    /// Staff: reopens a closed conversation.
    pub async fn reopen(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        self.conversations
            .update_status(id, ConversationStatus::Open)
            .await
    }

    /// Staff console listing, most recently active first.
    pub async fn list(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ChatError> {
        self.conversations.list(status).await
    }

    /// Clears the session store only; the history ledger and server data
    /// are untouched.
    pub fn clear_session(&self) {
        self.session.clear_active();
    }

    fn adopt(&self, conversation: &Conversation) {
        self.session
            .set_active(conversation.ref_code.clone(), conversation.id.clone());
        self.history.upsert(HistoryEntry {
            ref_code: conversation.ref_code.clone(),
            conversation_id: conversation.id.clone(),
            last_message_preview: conversation.last_message_preview.clone(),
            last_message_at: conversation.last_activity_at,
            status: conversation.status,
        });
    }
}
