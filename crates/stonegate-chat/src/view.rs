// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation chat view actor.
//!
//! [`ChatView::run`] is the single thread of control for one open
//! conversation: delivery events, send outcomes, and handle commands all
//! funnel into it, and only it mutates the reconciler. The merged state
//! is published on a watch channel for the rendering layer.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stonegate_core::{
    ChatError, Conversation, ConversationStatus, MediaKind, MediaRef, MessageStore,
    NewMessage, NotificationCue, SenderRole, StoredMessage,
};
use stonegate_media::MediaPipeline;

use crate::channel::{ChannelHandle, DeliveryChannel, DeliveryEvent};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::reconcile::{OutgoingDraft, Reconciler, ViewMessage};
use crate::session::SessionStore;

/// What the rendering layer sees of one open conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatViewState {
    /// Merged, time-ordered message list including optimistic entries.
    pub messages: Vec<ViewMessage>,
    pub status: ConversationStatus,
    /// False once the conversation is observed closed; the compose
    /// affordance is withdrawn with it.
    pub can_compose: bool,
}

enum Command {
    Send(OutgoingDraft),
    Retry(String),
    Discard(String),
}

struct SendOutcome {
    local_id: String,
    result: Result<StoredMessage, ChatError>,
}

/// The actor owning one open conversation's state.
///
/// Exactly one delivery channel is live per view; switching
/// conversations means closing this view (which tears its channel down)
/// before opening the next one.
pub struct ChatView {
    conversation: Conversation,
    reconciler: Reconciler,
    messages: Arc<dyn MessageStore>,
    session: Arc<SessionStore>,
    history: Arc<HistoryLedger>,
    cue: Arc<dyn NotificationCue>,
    channel: Option<ChannelHandle>,
    events_rx: mpsc::Receiver<DeliveryEvent>,
    commands_rx: mpsc::Receiver<Command>,
    outcome_tx: mpsc::Sender<SendOutcome>,
    outcome_rx: mpsc::Receiver<SendOutcome>,
    state_tx: watch::Sender<ChatViewState>,
}

/// Cloneable handle the rendering layer drives a [`ChatView`] with.
#[derive(Clone)]
pub struct ChatViewHandle {
    conversation: Conversation,
    local_role: SenderRole,
    sender_name: Option<String>,
    pipeline: MediaPipeline,
    commands_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<ChatViewState>,
}

impl ChatView {
    /// Wires a view for `conversation` and starts its delivery channel.
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        conversation: Conversation,
        local_role: SenderRole,
        sender_name: Option<String>,
        channel: &dyn DeliveryChannel,
        messages: Arc<dyn MessageStore>,
        pipeline: MediaPipeline,
        session: Arc<SessionStore>,
        history: Arc<HistoryLedger>,
        cue: Arc<dyn NotificationCue>,
    ) -> Result<(ChatView, ChatViewHandle), ChatError> {
        let (events_tx, events_rx) = mpsc::channel(64);
        let channel_handle = channel.open(&conversation, events_tx).await?;

        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(ChatViewState {
            messages: Vec::new(),
            status: conversation.status,
            can_compose: conversation.status == ConversationStatus::Open,
        });

        let view = ChatView {
            reconciler: Reconciler::new(local_role),
            messages,
            session,
            history,
            cue,
            channel: Some(channel_handle),
            events_rx,
            commands_rx,
            outcome_tx,
            outcome_rx,
            state_tx,
            conversation: conversation.clone(),
        };
        let handle = ChatViewHandle {
            conversation,
            local_role,
            sender_name,
            pipeline,
            commands_tx,
            state_rx,
        };
        Ok((view, handle))
    }

    /// Runs the view until cancellation or until every handle is gone.
    ///
    /// Tears the delivery channel down on the way out; a send outcome
    /// arriving after that is simply dropped with its channel.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            ref_code = self.conversation.ref_code.as_str(),
            "chat view running"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.on_delivery(event),
                    None => break,
                },
                Some(outcome) = self.outcome_rx.recv() => self.on_outcome(outcome),
                command = self.commands_rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        if let Some(handle) = self.channel.take() {
            handle.close().await;
        }
        info!(
            ref_code = self.conversation.ref_code.as_str(),
            "chat view stopped"
        );
    }

    fn on_delivery(&mut self, event: DeliveryEvent) {
        match event {
            DeliveryEvent::Snapshot(list) => {
                let fresh = self.reconciler.apply_snapshot(list);
                self.absorb(fresh);
            }
            DeliveryEvent::Inserted(message) => {
                let fresh: Vec<StoredMessage> =
                    self.reconciler.apply_insert(message).into_iter().collect();
                self.absorb(fresh);
            }
            DeliveryEvent::Status(status) => {
                if status != self.conversation.status {
                    info!(status = %status, "conversation status observed");
                    self.conversation.status = status;
                }
                self.publish();
            }
        }
    }

    /// Handles newly observed messages: once-only cue per counterpart
    /// message, history refresh, state publication.
    fn absorb(&mut self, fresh: Vec<StoredMessage>) {
        if let Some(last) = fresh.last() {
            self.history.upsert(HistoryEntry {
                ref_code: self.conversation.ref_code.clone(),
                conversation_id: self.conversation.id.clone(),
                last_message_preview: Some(last.preview()),
                last_message_at: last.created_at,
                status: self.conversation.status,
            });
        }
        let counterpart = self.reconciler.local_role().counterpart();
        if self.session.snapshot().sound_enabled {
            for message in fresh.iter().filter(|m| m.sender_role == counterpart) {
                debug!(id = message.id.0.as_str(), "notification cue");
                self.cue.play();
            }
        }
        self.publish();
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Send(draft) => {
                if self.conversation.status == ConversationStatus::Closed {
                    // Policy rejection; the handle withdraws the compose
                    // affordance, so this only races a just-closed status.
                    warn!("send ignored: conversation is closed");
                    return;
                }
                let local_id = self.reconciler.begin_send(draft.clone());
                self.publish();
                self.submit(local_id, draft);
            }
            Command::Retry(local_id) => {
                if let Some(draft) = self.reconciler.retry(&local_id) {
                    self.publish();
                    self.submit(local_id, draft);
                }
            }
            Command::Discard(local_id) => {
                if self.reconciler.discard(&local_id) {
                    self.publish();
                }
            }
        }
    }

    /// Spawns the submission; the outcome funnels back into the loop.
    /// Never blocks the view, so further sends can overlap freely.
    fn submit(&self, local_id: String, draft: OutgoingDraft) {
        let new = NewMessage {
            conversation_id: self.conversation.id.clone(),
            ref_code: self.conversation.ref_code.clone(),
            sender_role: draft.sender_role,
            sender_name: draft.sender_name,
            text: draft.text,
            media: draft.media,
        };
        let messages = self.messages.clone();
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = messages.create(&new).await;
            // A closed receiver means the view was torn down; drop it.
            let _ = outcome_tx.send(SendOutcome { local_id, result }).await;
        });
    }

    fn on_outcome(&mut self, outcome: SendOutcome) {
        match outcome.result {
            Ok(stored) => {
                self.reconciler.confirm_send(&outcome.local_id, stored.clone());
                self.history.upsert(HistoryEntry {
                    ref_code: self.conversation.ref_code.clone(),
                    conversation_id: self.conversation.id.clone(),
                    last_message_preview: Some(stored.preview()),
                    last_message_at: stored.created_at,
                    status: self.conversation.status,
                });
            }
            Err(e) => {
                warn!(error = %e, local_id = outcome.local_id.as_str(), "message send failed");
                self.reconciler.mark_failed(&outcome.local_id);
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let _ = self.state_tx.send(ChatViewState {
            messages: self.reconciler.rendered(),
            status: self.conversation.status,
            can_compose: self.conversation.status == ConversationStatus::Open,
        });
    }
}

impl ChatViewHandle {
    /// The current merged state.
    pub fn state(&self) -> ChatViewState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatViewState> {
        self.state_rx.clone()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Sends a text message. The optimistic entry is visible before the
    /// submission resolves.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.ensure_compose()?;
        self.dispatch(Command::Send(OutgoingDraft {
            sender_role: self.local_role,
            sender_name: self.sender_name.clone(),
            text: Some(text),
            media: None,
        }))
        .await
    }

    /// Sends an already attached media reference, optionally captioned.
    pub async fn send_media(
        &self,
        media: MediaRef,
        caption: Option<String>,
    ) -> Result<(), ChatError> {
        self.ensure_compose()?;
        self.dispatch(Command::Send(OutgoingDraft {
            sender_role: self.local_role,
            sender_name: self.sender_name.clone(),
            text: caption,
            media: Some(media),
        }))
        .await
    }

    /// Runs the media pipeline and composes the message only when the
    /// upload succeeded; an attach failure creates nothing.
    pub async fn attach_and_send(
        &self,
        bytes: &[u8],
        kind: MediaKind,
        content_type: &str,
        caption: Option<String>,
    ) -> Result<(), ChatError> {
        self.ensure_compose()?;
        let media = self
            .pipeline
            .attach(&self.conversation.ref_code, bytes, kind, content_type)
            .await?;
        self.send_media(media, caption).await
    }

    /// Resubmits a failed entry.
    pub async fn retry(&self, local_id: &str) -> Result<(), ChatError> {
        self.ensure_compose()?;
        self.dispatch(Command::Retry(local_id.to_string())).await
    }

    /// Drops a failed entry from the list.
    pub async fn discard(&self, local_id: &str) -> Result<(), ChatError> {
        self.dispatch(Command::Discard(local_id.to_string())).await
    }

    /// Compose suppression: refuses once the conversation was observed
    /// closed, before anything reaches a transport.
    fn ensure_compose(&self) -> Result<(), ChatError> {
        if self.state_rx.borrow().can_compose {
            Ok(())
        } else {
            Err(ChatError::ConversationClosed)
        }
    }

    async fn dispatch(&self, command: Command) -> Result<(), ChatError> {
        self.commands_tx
            .send(command)
            .await
            .map_err(|_| ChatError::Channel {
                message: "chat view is not running".to_string(),
                source: None,
            })
    }
}
