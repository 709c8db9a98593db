// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Stonegate support chat.

use thiserror::Error;

/// The primary error type used across all Stonegate collaborator traits
/// and core chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Delivery channel errors (fetch failure, subscription loss, submit failure).
    #[error("delivery error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A conversation with this reference code already exists.
    ///
    /// Raised by `ConversationStore::create` so the caller can regenerate
    /// the code and retry.
    #[error("reference code {code} already exists")]
    CodeConflict { code: String },

    /// No conversation matches the given reference code.
    #[error("no conversation found for reference code {code}")]
    NotFound { code: String },

    /// The conversation is closed and rejects new replies.
    ///
    /// A policy rejection, not a transport error.
    #[error("conversation is closed to new replies")]
    ConversationClosed,

    /// Media upload failed; no message was created.
    #[error("media attach failed: {message}")]
    Attach {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A message must carry a text body or a media attachment.
    #[error("message carries neither text nor media")]
    EmptyMessage,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
