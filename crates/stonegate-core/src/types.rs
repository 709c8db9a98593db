// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Stonegate support chat workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ChatError;

/// Internal durable identifier of a conversation. Never shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// Durable identifier of a stored message (server-assigned).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Default reference-code prefix for a stock deployment.
pub const DEFAULT_REF_CODE_PREFIX: &str = "SPG";

const REF_CODE_SUFFIX_LEN: usize = 5;
const REF_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Short, human-shareable conversation reference code.
///
/// Format: a 3-letter uppercase prefix, a hyphen, and a 5-character
/// suffix drawn from `A-Z0-9`, e.g. `SPG-7K2QX`. The code is the only
/// identity a customer needs to retain to resume a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefCode(String);

impl RefCode {
    /// Generates a fresh code: `prefix` + hyphen + random 5-char suffix.
    ///
    /// Uniqueness is not guaranteed here; `ConversationStore::create`
    /// detects collisions so the caller can regenerate.
    pub fn generate(prefix: &str) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let suffix: String = (0..REF_CODE_SUFFIX_LEN)
            .map(|_| REF_CODE_ALPHABET[rng.gen_range(0..REF_CODE_ALPHABET.len())] as char)
            .collect();
        Self(format!("{prefix}-{suffix}"))
    }

    /// Normalizes raw user input (trim, uppercase) and checks the shape.
    ///
    /// Returns `NotFound` on malformed input so resume flows surface the
    /// same user-facing error as an unknown code.
    pub fn normalize(input: &str) -> Result<Self, ChatError> {
        let code = input.trim().to_ascii_uppercase();
        if Self::is_well_formed(&code) {
            Ok(Self(code))
        } else {
            Err(ChatError::NotFound { code })
        }
    }

    fn is_well_formed(code: &str) -> bool {
        let Some((prefix, suffix)) = code.split_once('-') else {
            return false;
        };
        prefix.len() == 3
            && prefix.chars().all(|c| c.is_ascii_uppercase())
            && suffix.len() == REF_CODE_SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Open,
    Closed,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Customer,
    Staff,
}

impl SenderRole {
    /// The role on the other side of the conversation.
    pub fn counterpart(self) -> Self {
        match self {
            SenderRole::Customer => SenderRole::Staff,
            SenderRole::Staff => SenderRole::Customer,
        }
    }
}

/// Kind of an attached media object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Short human label used for previews of media-only messages.
    pub fn preview_label(self) -> &'static str {
        match self {
            MediaKind::Image => "Photo",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Voice note",
        }
    }
}

/// Durable reference to an uploaded media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Publicly fetchable URL.
    pub url: String,
    pub kind: MediaKind,
}

/// Client-only delivery status of an optimistic message entry.
///
/// Exists only until the server echo confirms or rejects the entry;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Failed,
}

/// A support conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub ref_code: RefCode,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub last_message_preview: Option<String>,
}

/// Input to `ConversationStore::create`: the store assigns the durable
/// id, timestamps, and open status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversation {
    pub ref_code: RefCode,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

/// A server-confirmed message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    /// Denormalized for filtering without a join.
    pub ref_code: RefCode,
    pub sender_role: SenderRole,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub media: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl StoredMessage {
    /// One-line preview text: the body, or a label for media-only messages.
    pub fn preview(&self) -> String {
        if let Some(text) = self.text.as_deref() {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
        match &self.media {
            Some(media) => media.kind.preview_label().to_string(),
            None => String::new(),
        }
    }
}

/// Input to `MessageStore::create`: everything but the server-assigned
/// id, timestamp, and read flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub ref_code: RefCode,
    pub sender_role: SenderRole,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub media: Option<MediaRef>,
}

impl NewConversation {
    pub fn new(ref_code: RefCode) -> Self {
        Self {
            ref_code,
            customer_name: None,
            customer_phone: None,
        }
    }
}

impl NewMessage {
    /// A message is meaningful only when it carries text or media.
    pub fn validate(&self) -> Result<(), ChatError> {
        let has_text = self
            .text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if has_text || self.media.is_some() {
            Ok(())
        } else {
            Err(ChatError::EmptyMessage)
        }
    }
}

/// A change observed on a conversation's push feed.
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    /// A message was inserted into the conversation.
    Message(StoredMessage),
    /// The conversation's lifecycle status changed.
    StatusChanged(ConversationStatus),
}
