// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-local chat session state.
//!
//! An explicit context object handed down from the composition root:
//! readers take a snapshot or subscribe to the watch channel; writers go
//! through the typed setters. Never ambient global state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use stonegate_core::{ConversationId, LocalStore, RefCode};

const SESSION_KEY: &str = "stonegate.session";

/// The active conversation's identity pair.
///
/// Reference code and conversation id live in one struct so that one can
/// never be set (or cleared) without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub ref_code: RefCode,
    pub conversation_id: ConversationId,
}

/// Everything the widget persists about the current visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: Option<ActiveSession>,
    pub sound_enabled: bool,
}

/// Persistent session store over the device-local key-value store.
pub struct SessionStore {
    local: Arc<dyn LocalStore>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Loads the persisted session, falling back to an empty one with
    /// the configured notification default.
    pub fn load(local: Arc<dyn LocalStore>, default_sound: bool) -> Self {
        let snapshot = local
            .get(SESSION_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(SessionSnapshot {
                active: None,
                sound_enabled: default_sound,
            });
        let (tx, _) = watch::channel(snapshot);
        Self { local, tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Sets the active conversation -- code and id together, always.
    pub fn set_active(&self, ref_code: RefCode, conversation_id: ConversationId) {
        debug!(ref_code = ref_code.as_str(), "session set");
        self.update(|s| {
            s.active = Some(ActiveSession {
                ref_code,
                conversation_id,
            });
        });
    }

    /// Clears the active conversation (back to the start screen).
    pub fn clear_active(&self) {
        debug!("session cleared");
        self.update(|s| s.active = None);
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.update(|s| s.sound_enabled = enabled);
    }

    fn update(&self, mutate: impl FnOnce(&mut SessionSnapshot)) {
        self.tx.send_modify(mutate);
        let snapshot = self.tx.borrow().clone();
        match serde_json::to_string(&snapshot) {
            Ok(raw) => self.local.set(SESSION_KEY, &raw),
            Err(e) => tracing::warn!(error = %e, "session serialize failed"),
        }
    }
}
