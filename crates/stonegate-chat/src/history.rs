// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-local ledger of past conversations.
//!
//! Backs the "resume a previous conversation" picker. Independent of the
//! session store and of authentication: it survives sign-out and is
//! never synchronized across devices.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use stonegate_core::{ConversationId, ConversationStatus, LocalStore, RefCode};

const HISTORY_KEY: &str = "stonegate.history";

/// One past conversation the visitor participated in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ref_code: RefCode,
    pub conversation_id: ConversationId,
    pub last_message_preview: Option<String>,
    pub last_message_at: DateTime<Utc>,
    /// Status snapshot as of the last observation; may be stale.
    pub status: ConversationStatus,
}

/// Bounded, most-recent-first conversation history.
pub struct HistoryLedger {
    local: Arc<dyn LocalStore>,
    cap: usize,
}

impl HistoryLedger {
    pub fn new(local: Arc<dyn LocalStore>, cap: usize) -> Self {
        Self { local, cap }
    }

    /// All entries, most recently active first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.local
            .get(HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(error = %e, "history ledger corrupt, starting empty");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Inserts or refreshes the entry for a reference code.
    ///
    /// Replace-by-ref-code: at most one entry per code. The refreshed
    /// entry moves to the front; anything beyond the cap falls off the
    /// end silently.
    pub fn upsert(&self, entry: HistoryEntry) {
        let mut entries = self.entries();
        entries.retain(|e| e.ref_code != entry.ref_code);
        entries.insert(0, entry);
        entries.truncate(self.cap);
        self.save(&entries);
    }

    /// Removes one entry; user-initiated, immediate.
    pub fn remove(&self, ref_code: &RefCode) {
        let mut entries = self.entries();
        entries.retain(|e| &e.ref_code != ref_code);
        self.save(&entries);
    }

    fn save(&self, entries: &[HistoryEntry]) {
        match serde_json::to_string(entries) {
            Ok(raw) => self.local.set(HISTORY_KEY, &raw),
            Err(e) => warn!(error = %e, "history serialize failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stonegate_test_utils::MemoryLocalStore;

    fn entry(code: &str, minute: u32) -> HistoryEntry {
        HistoryEntry {
            ref_code: RefCode::normalize(code).unwrap(),
            conversation_id: ConversationId(format!("id-{code}")),
            last_message_preview: Some(format!("preview {code}")),
            last_message_at: DateTime::<Utc>::from_timestamp(i64::from(minute) * 60, 0).unwrap(),
            status: ConversationStatus::Open,
        }
    }

    fn ledger(cap: usize) -> HistoryLedger {
        HistoryLedger::new(Arc::new(MemoryLocalStore::new()), cap)
    }

    #[test]
    fn upsert_prepends_most_recent_first() {
        let ledger = ledger(10);
        ledger.upsert(entry("SPG-AAAAA", 1));
        ledger.upsert(entry("SPG-BBBBB", 2));

        let entries = ledger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ref_code.as_str(), "SPG-BBBBB");
        assert_eq!(entries[1].ref_code.as_str(), "SPG-AAAAA");
    }

    #[test]
    fn upsert_replaces_by_ref_code() {
        let ledger = ledger(10);
        ledger.upsert(entry("SPG-AAAAA", 1));
        ledger.upsert(entry("SPG-BBBBB", 2));

        let mut refreshed = entry("SPG-AAAAA", 3);
        refreshed.last_message_preview = Some("newer".into());
        ledger.upsert(refreshed);

        let entries = ledger.entries();
        assert_eq!(entries.len(), 2, "no duplicate per ref code");
        assert_eq!(entries[0].ref_code.as_str(), "SPG-AAAAA");
        assert_eq!(entries[0].last_message_preview.as_deref(), Some("newer"));
    }

    #[test]
    fn cap_evicts_oldest_entries() {
        let ledger = ledger(3);
        for (i, code) in ["SPG-AAAAA", "SPG-BBBBB", "SPG-CCCCC", "SPG-DDDDD", "SPG-EEEEE"]
            .iter()
            .enumerate()
        {
            ledger.upsert(entry(code, i as u32));
        }

        let entries = ledger.entries();
        assert_eq!(entries.len(), 3, "never exceeds the cap");
        let codes: Vec<_> = entries.iter().map(|e| e.ref_code.as_str()).collect();
        assert_eq!(codes, vec!["SPG-EEEEE", "SPG-DDDDD", "SPG-CCCCC"]);
    }

    #[test]
    fn remove_deletes_one_entry() {
        let ledger = ledger(10);
        ledger.upsert(entry("SPG-AAAAA", 1));
        ledger.upsert(entry("SPG-BBBBB", 2));

        ledger.remove(&RefCode::normalize("SPG-AAAAA").unwrap());
        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ref_code.as_str(), "SPG-BBBBB");
    }

    #[test]
    fn ledger_persists_across_instances() {
        let local = Arc::new(MemoryLocalStore::new());
        HistoryLedger::new(local.clone(), 10).upsert(entry("SPG-AAAAA", 1));

        let reloaded = HistoryLedger::new(local, 10);
        assert_eq!(reloaded.entries().len(), 1);
    }
}
