// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the chat engine over in-memory collaborators.
//!
//! Each test builds an isolated harness; tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use stonegate_chat::{
    ChatView, ChatViewHandle, ChatViewState, HistoryLedger, LifecycleController, PollChannel,
    PushChannel, SessionStore,
};
use stonegate_config::ChatConfig;
use stonegate_core::{
    ChatError, Conversation, ConversationStatus, DeliveryStatus, MediaKind, MessageStore,
    NewMessage, SenderRole,
};
use stonegate_media::MediaPipeline;
use stonegate_test_utils::{MemoryLocalStore, MemoryObjectStore, MemoryStore, RecordingCue};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const WAIT: Duration = Duration::from_secs(3);

struct Harness {
    store: Arc<MemoryStore>,
    session: Arc<SessionStore>,
    history: Arc<HistoryLedger>,
    controller: LifecycleController,
    cue: Arc<RecordingCue>,
    objects: Arc<MemoryObjectStore>,
    pipeline: MediaPipeline,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = ChatConfig::default();
    let store = Arc::new(MemoryStore::new());
    let local = Arc::new(MemoryLocalStore::new());
    let session = Arc::new(SessionStore::load(local.clone(), config.notification_sound));
    let history = Arc::new(HistoryLedger::new(local, config.history_cap));
    let controller = LifecycleController::new(
        store.clone(),
        session.clone(),
        history.clone(),
        &config,
    );
    let objects = Arc::new(MemoryObjectStore::new("https://cdn.example/chat"));
    let pipeline = MediaPipeline::new(objects.clone(), 1024 * 1024);
    Harness {
        store,
        session,
        history,
        controller,
        cue: Arc::new(RecordingCue::new()),
        objects,
        pipeline,
    }
}

impl Harness {
    /// Opens a customer view in poll mode and runs it in the background.
    async fn open_poll_view(
        &self,
        conversation: &Conversation,
    ) -> (ChatViewHandle, CancellationToken) {
        let channel = PollChannel::with_interval(
            self.store.clone(),
            self.store.clone(),
            POLL_INTERVAL,
        );
        self.open_view(conversation, &channel).await
    }

    async fn open_push_view(
        &self,
        conversation: &Conversation,
    ) -> (ChatViewHandle, CancellationToken) {
        let channel = PushChannel::new(self.store.clone());
        self.open_view(conversation, &channel).await
    }

    async fn open_view(
        &self,
        conversation: &Conversation,
        channel: &dyn stonegate_chat::DeliveryChannel,
    ) -> (ChatViewHandle, CancellationToken) {
        let (view, handle) = ChatView::open(
            conversation.clone(),
            SenderRole::Customer,
            conversation.customer_name.clone(),
            channel,
            self.store.clone(),
            self.pipeline.clone(),
            self.session.clone(),
            self.history.clone(),
            self.cue.clone(),
        )
        .await
        .unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(view.run(cancel.clone()));
        (handle, cancel)
    }

    /// A staff reply arriving through the persistence collaborator.
    async fn staff_reply(&self, conversation: &Conversation, text: &str) {
        MessageStore::create(
            self.store.as_ref(),
            &NewMessage {
                conversation_id: conversation.id.clone(),
                ref_code: conversation.ref_code.clone(),
                sender_role: SenderRole::Staff,
                sender_name: Some("Support".into()),
                text: Some(text.to_string()),
                media: None,
            },
        )
        .await
        .unwrap();
    }
}

/// Waits for the first published state, i.e. the first snapshot from the
/// delivery channel. Cue assertions depend on the backlog having primed.
async fn primed(rx: &mut watch::Receiver<ChatViewState>) {
    tokio::time::timeout(WAIT, rx.changed())
        .await
        .expect("no initial snapshot in time")
        .expect("view state channel closed");
}

async fn wait_for(
    rx: &mut watch::Receiver<ChatViewState>,
    what: &str,
    pred: impl Fn(&ChatViewState) -> bool,
) {
    tokio::time::timeout(WAIT, async {
        loop {
            if pred(&rx.borrow()) {
                return;
            }
            rx.changed().await.expect("view state channel closed");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for: {what}"));
}

// ---- Lifecycle ----

#[tokio::test]
async fn start_new_sets_session_and_history_together() {
    let h = harness();
    let conversation = h.controller.start_new(Some("Dana".into()), None).await.unwrap();

    assert!(conversation.ref_code.as_str().starts_with("SPG-"));
    assert_eq!(conversation.status, ConversationStatus::Open);

    let active = h.session.snapshot().active.expect("session populated");
    assert_eq!(active.ref_code, conversation.ref_code);
    assert_eq!(active.conversation_id, conversation.id);

    let entries = h.history.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ref_code, conversation.ref_code);
}

#[tokio::test]
async fn start_new_regenerates_on_code_conflict() {
    let h = harness();
    h.store.conflict_next_creates(2);

    let conversation = h.controller.start_new(None, None).await.unwrap();
    assert!(h.session.snapshot().active.is_some());
    assert!(conversation.ref_code.as_str().starts_with("SPG-"));
}

#[tokio::test]
async fn start_new_gives_up_after_bounded_attempts() {
    let h = harness();
    h.store.conflict_next_creates(u32::MAX);

    let err = h.controller.start_new(None, None).await.unwrap_err();
    assert!(matches!(err, ChatError::Internal(_)));
    assert!(h.session.snapshot().active.is_none(), "no state mutation on failure");
}

#[tokio::test]
async fn start_new_failure_leaves_session_untouched() {
    let h = harness();
    h.store.fail_next_creates(1);

    let err = h.controller.start_new(None, None).await.unwrap_err();
    assert!(matches!(err, ChatError::Storage { .. }));
    assert!(h.session.snapshot().active.is_none());
    assert!(h.history.entries().is_empty());
}

#[tokio::test]
async fn resume_by_code_normalizes_and_upserts_history_once() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    h.controller.clear_session();
    assert!(h.session.snapshot().active.is_none());

    let lowered = format!("  {} ", conversation.ref_code.as_str().to_lowercase());
    let resumed = h.controller.resume_by_code(&lowered).await.unwrap();
    assert_eq!(resumed.id, conversation.id);

    let active = h.session.snapshot().active.unwrap();
    assert_eq!(active.ref_code, conversation.ref_code);
    assert_eq!(h.history.entries().len(), 1, "upsert, not append");
}

#[tokio::test]
async fn resume_unknown_code_is_not_found() {
    let h = harness();
    let err = h.controller.resume_by_code("spg-zzzzz").await.unwrap_err();
    assert!(matches!(err, ChatError::NotFound { code } if code == "SPG-ZZZZZ"));
    assert!(h.session.snapshot().active.is_none());
}

#[tokio::test]
async fn resume_from_history_needs_no_network() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let entry = h.history.entries().remove(0);
    h.controller.clear_session();

    // Even a dead store cannot fail a history resume.
    h.store.fail_fetches(true);
    h.controller.resume_from_history(&entry);

    let active = h.session.snapshot().active.unwrap();
    assert_eq!(active.conversation_id, conversation.id);
}

#[tokio::test]
async fn clear_session_keeps_history_and_server_data() {
    let h = harness();
    h.controller.start_new(None, None).await.unwrap();
    h.controller.clear_session();

    assert!(h.session.snapshot().active.is_none());
    assert_eq!(h.history.entries().len(), 1);
    assert_eq!(h.controller.list(None).await.unwrap().len(), 1);
}

// ---- Delivery and reconciliation ----

#[tokio::test]
async fn poll_view_surfaces_staff_reply_and_cues_once() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    // Let the first snapshot prime before the reply arrives.
    primed(&mut rx).await;
    h.staff_reply(&conversation, "We'll call you").await;

    wait_for(&mut rx, "staff reply visible", |s| {
        s.messages.iter().any(|m| m.text.as_deref() == Some("We'll call you"))
    })
    .await;

    // Several more polls must not re-announce the same message.
    tokio::time::sleep(POLL_INTERVAL * 4).await;
    assert_eq!(h.cue.plays(), 1);

    // History followed the observed message.
    let entry = &h.history.entries()[0];
    assert_eq!(entry.last_message_preview.as_deref(), Some("We'll call you"));
}

#[tokio::test]
async fn resumed_backlog_does_not_cue() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    h.staff_reply(&conversation, "earlier reply").await;
    h.staff_reply(&conversation, "another earlier reply").await;

    let (handle, _cancel) = h.open_push_view(&conversation).await;
    let mut rx = handle.subscribe();
    wait_for(&mut rx, "backlog visible", |s| s.messages.len() == 2).await;

    assert_eq!(h.cue.plays(), 0, "resumed backlog must stay silent");
}

#[tokio::test]
async fn sound_toggle_silences_the_cue() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    h.session.set_sound_enabled(false);

    let (handle, _cancel) = h.open_push_view(&conversation).await;
    let mut rx = handle.subscribe();
    primed(&mut rx).await;

    h.staff_reply(&conversation, "quiet reply").await;
    wait_for(&mut rx, "reply visible", |s| s.messages.len() == 1).await;
    assert_eq!(h.cue.plays(), 0);
}

#[tokio::test]
async fn send_text_is_optimistic_then_confirmed() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    handle.send_text("Hello").await.unwrap();

    // The optimistic entry appears without waiting for any transport.
    wait_for(&mut rx, "optimistic entry", |s| {
        s.messages.iter().any(|m| m.text.as_deref() == Some("Hello"))
    })
    .await;

    // And settles into exactly one confirmed record.
    wait_for(&mut rx, "confirmed entry", |s| {
        s.messages.len() == 1 && s.messages[0].delivery == DeliveryStatus::Sent
    })
    .await;
    assert!(!rx.borrow().messages[0].id.starts_with("local-"));
    assert_eq!(h.store.message_count(), 1);
}

#[tokio::test]
async fn failed_send_stays_visible_until_retried() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    h.store.fail_next_message_creates(1);
    handle.send_text("Hello").await.unwrap();

    wait_for(&mut rx, "failed entry", |s| {
        s.messages.len() == 1 && s.messages[0].delivery == DeliveryStatus::Failed
    })
    .await;
    assert_eq!(h.store.message_count(), 0);

    // Explicit retry resubmits the same entry.
    let local_id = rx.borrow().messages[0].id.clone();
    handle.retry(&local_id).await.unwrap();
    wait_for(&mut rx, "retried entry confirmed", |s| {
        s.messages.len() == 1 && s.messages[0].delivery == DeliveryStatus::Sent
    })
    .await;
    assert_eq!(h.store.message_count(), 1);
}

#[tokio::test]
async fn discard_removes_a_failed_send() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    h.store.fail_next_message_creates(1);
    handle.send_text("Hello").await.unwrap();
    wait_for(&mut rx, "failed entry", |s| {
        s.messages.first().is_some_and(|m| m.delivery == DeliveryStatus::Failed)
    })
    .await;

    let local_id = rx.borrow().messages[0].id.clone();
    handle.discard(&local_id).await.unwrap();
    wait_for(&mut rx, "entry discarded", |s| s.messages.is_empty()).await;
}

#[tokio::test]
async fn overlapping_sends_settle_independently() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    handle.send_text("one").await.unwrap();
    handle.send_text("two").await.unwrap();
    handle.send_text("three").await.unwrap();

    wait_for(&mut rx, "all three confirmed", |s| {
        s.messages.len() == 3
            && s.messages.iter().all(|m| m.delivery == DeliveryStatus::Sent)
    })
    .await;
    assert_eq!(h.store.message_count(), 3);
}

#[tokio::test]
async fn failed_poll_preserves_the_visible_list() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    h.staff_reply(&conversation, "visible reply").await;
    wait_for(&mut rx, "reply visible", |s| s.messages.len() == 1).await;

    h.store.fail_fetches(true);
    tokio::time::sleep(POLL_INTERVAL * 4).await;
    assert_eq!(rx.borrow().messages.len(), 1, "a failed poll must not clear the list");

    h.store.fail_fetches(false);
    h.staff_reply(&conversation, "after recovery").await;
    wait_for(&mut rx, "recovered", |s| s.messages.len() == 2).await;
}

#[tokio::test]
async fn push_view_receives_single_inserts() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_push_view(&conversation).await;
    let mut rx = handle.subscribe();
    primed(&mut rx).await;

    h.staff_reply(&conversation, "pushed").await;
    wait_for(&mut rx, "insert delivered", |s| {
        s.messages.iter().any(|m| m.text.as_deref() == Some("pushed"))
    })
    .await;
    assert_eq!(h.cue.plays(), 1);
}

// ---- Lifecycle status and compose suppression ----

#[tokio::test]
async fn closed_conversation_withdraws_compose() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();
    wait_for(&mut rx, "compose available", |s| s.can_compose).await;

    h.controller.close(&conversation.id).await.unwrap();
    wait_for(&mut rx, "compose withdrawn", |s| !s.can_compose).await;

    let err = handle.send_text("too late").await.unwrap_err();
    assert!(matches!(err, ChatError::ConversationClosed));
    assert_eq!(h.store.message_count(), 0);

    h.controller.reopen(&conversation.id).await.unwrap();
    wait_for(&mut rx, "compose restored", |s| s.can_compose).await;
    handle.send_text("welcome back").await.unwrap();
    wait_for(&mut rx, "message sent", |s| s.messages.len() == 1).await;
}

#[tokio::test]
async fn staff_console_lists_and_marks_read() {
    let h = harness();
    let first = h.controller.start_new(Some("Avery".into()), None).await.unwrap();
    let second = h.controller.start_new(None, None).await.unwrap();
    h.staff_reply(&first, "bump activity").await;

    let listed = h.controller.list(None).await.unwrap();
    assert_eq!(listed[0].id, first.id, "most recently active first");
    assert_eq!(listed[1].id, second.id);

    MessageStore::create(
        h.store.as_ref(),
        &NewMessage {
            conversation_id: first.id.clone(),
            ref_code: first.ref_code.clone(),
            sender_role: SenderRole::Customer,
            sender_name: Some("Avery".into()),
            text: Some("unread question".into()),
            media: None,
        },
    )
    .await
    .unwrap();
    h.store.mark_read(&first.id, SenderRole::Customer).await.unwrap();

    let messages = h.store.list_by_conversation(&first.id).await.unwrap();
    assert!(messages
        .iter()
        .filter(|m| m.sender_role == SenderRole::Customer)
        .all(|m| m.read));
}

// ---- Media ----

#[tokio::test]
async fn attach_and_send_composes_a_media_message() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;
    let mut rx = handle.subscribe();

    handle
        .attach_and_send(b"jpeg bytes", MediaKind::Image, "image/jpeg", Some("the slab".into()))
        .await
        .unwrap();

    wait_for(&mut rx, "media message confirmed", |s| {
        s.messages.len() == 1 && s.messages[0].delivery == DeliveryStatus::Sent
    })
    .await;
    let state = rx.borrow().clone();
    let media = state.messages[0].media.as_ref().unwrap();
    assert_eq!(media.kind, MediaKind::Image);
    assert!(media.url.contains(conversation.ref_code.as_str()));
    assert_eq!(state.messages[0].text.as_deref(), Some("the slab"));
    assert_eq!(h.objects.upload_count(), 1);
}

#[tokio::test]
async fn attach_failure_creates_no_message() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, _cancel) = h.open_poll_view(&conversation).await;

    h.objects.fail_uploads(true);
    let err = handle
        .attach_and_send(b"bytes", MediaKind::Audio, "audio/ogg", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Attach { .. }));

    tokio::time::sleep(POLL_INTERVAL * 2).await;
    assert!(handle.state().messages.is_empty());
    assert_eq!(h.store.message_count(), 0);
}

// ---- Teardown ----

#[tokio::test]
async fn cancelled_view_rejects_further_commands() {
    let h = harness();
    let conversation = h.controller.start_new(None, None).await.unwrap();
    let (handle, cancel) = h.open_poll_view(&conversation).await;

    cancel.cancel();
    // Give the run loop a moment to wind down and close its channel.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = handle.send_text("into the void").await.unwrap_err();
    assert!(matches!(err, ChatError::Channel { .. }));
}

// ---- SQLite end-to-end ----

#[tokio::test]
async fn full_flow_over_sqlite() {
    use stonegate_storage::SqliteStore;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chat.db");
    let store = Arc::new(SqliteStore::open(db_path.to_str().unwrap()).await.unwrap());

    let config = ChatConfig::default();
    let local = Arc::new(MemoryLocalStore::new());
    let session = Arc::new(SessionStore::load(local.clone(), true));
    let history = Arc::new(HistoryLedger::new(local, config.history_cap));
    let controller =
        LifecycleController::new(store.clone(), session.clone(), history.clone(), &config);

    let conversation = controller.start_new(Some("Dana".into()), None).await.unwrap();

    let objects = Arc::new(MemoryObjectStore::new("https://cdn.example/chat"));
    let pipeline = MediaPipeline::new(objects, 1024 * 1024);
    let cue = Arc::new(RecordingCue::new());
    let channel = PollChannel::with_interval(store.clone(), store.clone(), POLL_INTERVAL);

    let (view, handle) = ChatView::open(
        conversation.clone(),
        SenderRole::Customer,
        Some("Dana".into()),
        &channel,
        store.clone(),
        pipeline,
        session,
        history.clone(),
        cue.clone(),
    )
    .await
    .unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(view.run(cancel.clone()));
    let mut rx = handle.subscribe();

    primed(&mut rx).await;
    handle.send_text("Do you carry soapstone?").await.unwrap();
    wait_for(&mut rx, "customer message confirmed", |s| {
        s.messages.len() == 1 && s.messages[0].delivery == DeliveryStatus::Sent
    })
    .await;

    MessageStore::create(
        store.as_ref(),
        &NewMessage {
            conversation_id: conversation.id.clone(),
            ref_code: conversation.ref_code.clone(),
            sender_role: SenderRole::Staff,
            sender_name: Some("Support".into()),
            text: Some("We do -- three finishes.".into()),
            media: None,
        },
    )
    .await
    .unwrap();

    wait_for(&mut rx, "staff reply visible", |s| s.messages.len() == 2).await;
    assert_eq!(cue.plays(), 1);

    controller.close(&conversation.id).await.unwrap();
    wait_for(&mut rx, "compose withdrawn", |s| !s.can_compose).await;
    assert!(matches!(
        handle.send_text("one more").await.unwrap_err(),
        ChatError::ConversationClosed
    ));

    cancel.cancel();
}
