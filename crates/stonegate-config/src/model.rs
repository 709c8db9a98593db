// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Stonegate support chat.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Stonegate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StonegateConfig {
    /// Chat widget behavior settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Relational storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media object storage settings.
    #[serde(default)]
    pub media: MediaConfig,
}

/// How message updates reach an open conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Periodic full-list fetches.
    Poll,
    /// Conversation-scoped change-feed subscription.
    Push,
}

/// Chat widget behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Reference-code prefix, 3 uppercase letters.
    #[serde(default = "default_ref_code_prefix")]
    pub ref_code_prefix: String,

    /// Delivery strategy for open conversation views.
    #[serde(default = "default_delivery_mode")]
    pub delivery_mode: DeliveryMode,

    /// Poll-mode fetch interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum entries retained in the device-local history ledger.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Whether the notification cue is enabled for fresh sessions.
    #[serde(default = "default_notification_sound")]
    pub notification_sound: bool,

    /// Attempts at minting a unique reference code before giving up.
    #[serde(default = "default_code_mint_attempts")]
    pub code_mint_attempts: u32,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ref_code_prefix: default_ref_code_prefix(),
            delivery_mode: default_delivery_mode(),
            poll_interval_secs: default_poll_interval_secs(),
            history_cap: default_history_cap(),
            notification_sound: default_notification_sound(),
            code_mint_attempts: default_code_mint_attempts(),
            log_level: default_log_level(),
        }
    }
}

/// Relational storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Media object storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Root directory media objects are written under.
    #[serde(default = "default_media_root_dir")]
    pub root_dir: String,

    /// Base URL uploads are served from; keys are appended to it.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Upper bound on a single upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: default_media_root_dir(),
            public_base_url: default_public_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_ref_code_prefix() -> String {
    stonegate_core::DEFAULT_REF_CODE_PREFIX.to_string()
}

fn default_delivery_mode() -> DeliveryMode {
    DeliveryMode::Poll
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_history_cap() -> usize {
    20
}

fn default_notification_sound() -> bool {
    true
}

fn default_code_mint_attempts() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> String {
    "stonegate.db".to_string()
}

fn default_media_root_dir() -> String {
    "media".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/media".to_string()
}

fn default_max_upload_bytes() -> u64 {
    25 * 1024 * 1024
}
