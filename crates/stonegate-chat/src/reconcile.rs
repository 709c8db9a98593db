// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic/authoritative message reconciliation.
//!
//! The authoritative snapshot from the delivery channel is the source of
//! truth; locally pending sends are a temporary overlay removed once the
//! server echo subsumes them. [`merge`] is a pure function so the whole
//! reconciliation contract is testable without any transport.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use stonegate_core::{DeliveryStatus, MediaRef, SenderRole, StoredMessage};

/// Draft of an outgoing message before it reaches the message store.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingDraft {
    pub sender_role: SenderRole,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub media: Option<MediaRef>,
}

/// A locally tracked send: in flight, confirmed but not yet observed in
/// a snapshot, or failed.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Temporary client-assigned id, valid until the entry is dropped.
    pub local_id: String,
    pub draft: OutgoingDraft,
    pub created_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    /// The authoritative record once the submission was confirmed.
    pub confirmed: Option<StoredMessage>,
}

/// One renderable entry of the merged, time-ordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewMessage {
    /// Durable id when confirmed, the temporary local id otherwise.
    pub id: String,
    pub sender_role: SenderRole,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub media: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub delivery: DeliveryStatus,
}

fn view_of_stored(message: &StoredMessage, delivery: DeliveryStatus) -> ViewMessage {
    ViewMessage {
        id: message.id.0.clone(),
        sender_role: message.sender_role,
        sender_name: message.sender_name.clone(),
        text: message.text.clone(),
        media: message.media.clone(),
        created_at: message.created_at,
        delivery,
    }
}

fn view_of_pending(pending: &PendingMessage) -> ViewMessage {
    match &pending.confirmed {
        Some(stored) => view_of_stored(stored, DeliveryStatus::Sent),
        None => ViewMessage {
            id: pending.local_id.clone(),
            sender_role: pending.draft.sender_role,
            sender_name: pending.draft.sender_name.clone(),
            text: pending.draft.text.clone(),
            media: pending.draft.media.clone(),
            created_at: pending.created_at,
            delivery: pending.status,
        },
    }
}

/// A remote record represents an unconfirmed send when role, body, and
/// media URL all match. The authoritative record never shares the
/// temporary id, so this heuristic is the only available link.
fn matches_draft(message: &StoredMessage, draft: &OutgoingDraft) -> bool {
    message.sender_role == draft.sender_role
        && message.text == draft.text
        && message.media.as_ref().map(|m| &m.url) == draft.media.as_ref().map(|m| &m.url)
}

fn is_represented(pending: &PendingMessage, remote: &[StoredMessage]) -> bool {
    if let Some(confirmed) = &pending.confirmed {
        return remote.iter().any(|m| m.id == confirmed.id);
    }
    match pending.status {
        // A failed entry exists nowhere else; it stays visible until the
        // caller retries or discards it.
        DeliveryStatus::Failed => false,
        _ => remote.iter().any(|m| matches_draft(m, &pending.draft)),
    }
}

/// Merge the authoritative snapshot with the pending overlay.
///
/// The snapshot comes first, time-ordered (stable sort, so equal
/// timestamps keep arrival order) and deduplicated by durable id; every
/// pending entry not represented in it is appended at the end so an
/// in-flight send is never visually lost. Pure and idempotent.
pub fn merge(remote: &[StoredMessage], pending: &[PendingMessage]) -> Vec<ViewMessage> {
    let mut out = Vec::with_capacity(remote.len() + pending.len());
    let mut ids = HashSet::new();

    let mut snapshot: Vec<&StoredMessage> = remote
        .iter()
        .filter(|m| ids.insert(m.id.0.clone()))
        .collect();
    snapshot.sort_by_key(|m| m.created_at);

    for message in snapshot {
        out.push(view_of_stored(message, DeliveryStatus::Sent));
    }
    for entry in pending {
        if !is_represented(entry, remote) {
            out.push(view_of_pending(entry));
        }
    }
    out
}

/// Per-conversation reconciliation state.
///
/// All producers (local send, remote snapshot, push insert) funnel their
/// mutations through this one struct, which is owned by the single chat
/// view task.
pub struct Reconciler {
    local_role: SenderRole,
    remote: Vec<StoredMessage>,
    pending: Vec<PendingMessage>,
    /// Durable ids already observed; drives once-only notification cues.
    seen: HashSet<String>,
    /// Set after the first snapshot: resumed backlog must not chime.
    primed: bool,
}

impl Reconciler {
    pub fn new(local_role: SenderRole) -> Self {
        Self {
            local_role,
            remote: Vec::new(),
            pending: Vec::new(),
            seen: HashSet::new(),
            primed: false,
        }
    }

    pub fn local_role(&self) -> SenderRole {
        self.local_role
    }

    /// Appends an optimistic entry and returns its temporary id.
    pub fn begin_send(&mut self, draft: OutgoingDraft) -> String {
        let local_id = format!("local-{}", uuid::Uuid::new_v4());
        self.pending.push(PendingMessage {
            local_id: local_id.clone(),
            draft,
            created_at: Utc::now(),
            status: DeliveryStatus::Sending,
            confirmed: None,
        });
        local_id
    }

    /// Replaces the temporary entry with the authoritative record.
    ///
    /// The overlay entry stays until a snapshot carries the durable id,
    /// at which point the merge drops the now-redundant copy.
    pub fn confirm_send(&mut self, local_id: &str, stored: StoredMessage) {
        self.seen.insert(stored.id.0.clone());
        if let Some(entry) = self.pending.iter_mut().find(|p| p.local_id == local_id) {
            entry.status = DeliveryStatus::Sent;
            entry.confirmed = Some(stored);
        }
    }

    /// Flags the entry failed in place; it remains visible and is never
    /// retried automatically.
    pub fn mark_failed(&mut self, local_id: &str) {
        if let Some(entry) = self.pending.iter_mut().find(|p| p.local_id == local_id) {
            entry.status = DeliveryStatus::Failed;
        }
    }

    /// Puts a failed entry back in flight and hands the caller its draft
    /// for resubmission.
    pub fn retry(&mut self, local_id: &str) -> Option<OutgoingDraft> {
        let entry = self
            .pending
            .iter_mut()
            .find(|p| p.local_id == local_id && p.status == DeliveryStatus::Failed)?;
        entry.status = DeliveryStatus::Sending;
        Some(entry.draft.clone())
    }

    /// Removes a pending entry entirely (user discarded a failed send).
    pub fn discard(&mut self, local_id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.local_id != local_id);
        before != self.pending.len()
    }

    /// Replaces the authoritative list with a fresh snapshot.
    ///
    /// Returns the messages observed for the first time, in snapshot
    /// order -- except on the very first snapshot, which primes the seen
    /// set silently so a resumed backlog does not re-announce itself.
    pub fn apply_snapshot(&mut self, snapshot: Vec<StoredMessage>) -> Vec<StoredMessage> {
        let fresh: Vec<StoredMessage> = snapshot
            .iter()
            .filter(|m| !self.seen.contains(&m.id.0))
            .cloned()
            .collect();
        for message in &snapshot {
            self.seen.insert(message.id.0.clone());
        }
        self.remote = snapshot;
        self.prune_subsumed();

        if self.primed {
            fresh
        } else {
            self.primed = true;
            debug!(backlog = self.remote.len(), "first snapshot primed");
            Vec::new()
        }
    }

    /// Appends a single pushed insert. Returns it when newly observed.
    pub fn apply_insert(&mut self, message: StoredMessage) -> Option<StoredMessage> {
        if !self.seen.insert(message.id.0.clone()) {
            return None;
        }
        self.remote.push(message.clone());
        self.prune_subsumed();
        Some(message)
    }

    /// Drops confirmed overlay entries whose durable id reached the
    /// authoritative list.
    fn prune_subsumed(&mut self) {
        let remote_ids: HashSet<&str> = self.remote.iter().map(|m| m.id.0.as_str()).collect();
        self.pending.retain(|p| match &p.confirmed {
            Some(confirmed) => !remote_ids.contains(confirmed.id.0.as_str()),
            None => true,
        });
    }

    /// The merged, time-ordered list to render.
    pub fn rendered(&self) -> Vec<ViewMessage> {
        merge(&self.remote, &self.pending)
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
