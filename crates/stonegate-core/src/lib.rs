// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Stonegate support chat.
//!
//! This crate provides the error type, domain types, and collaborator
//! trait definitions used throughout the Stonegate workspace. Storage,
//! media, and chat-engine crates all build on the contracts defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChatError;
pub use types::{
    Conversation, ConversationEvent, ConversationId, ConversationStatus, DeliveryStatus,
    MediaKind, MediaRef, MessageId, NewConversation, NewMessage, RefCode, SenderRole,
    StoredMessage, DEFAULT_REF_CODE_PREFIX,
};

// Re-export all collaborator traits at crate root.
pub use traits::{ConversationStore, LocalStore, MessageStore, NotificationCue, ObjectStore};
