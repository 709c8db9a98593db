// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel abstraction: poll and push strategies.
//!
//! Both strategies present the same contract toward the chat view -- a
//! stream of [`DeliveryEvent`]s -- so the reconciler never learns which
//! one is active. Transient fetch/subscribe failures leave prior state
//! untouched and are retried on the next scheduled trigger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stonegate_config::ChatConfig;
use stonegate_core::{
    ChatError, Conversation, ConversationEvent, ConversationStatus, ConversationStore,
    MessageStore, StoredMessage,
};

/// What a delivery channel yields to the chat view.
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// The authoritative full message list.
    Snapshot(Vec<StoredMessage>),
    /// A single newly inserted message (push mode).
    Inserted(StoredMessage),
    /// The conversation's current lifecycle status.
    Status(ConversationStatus),
}

/// Transport strategy for one open conversation view.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Starts delivering events for `conversation` into `events`.
    ///
    /// Exactly one channel may be live per mounted view; the returned
    /// handle tears the background task down on close or drop.
    async fn open(
        &self,
        conversation: &Conversation,
        events: mpsc::Sender<DeliveryEvent>,
    ) -> Result<ChannelHandle, ChatError>;
}

/// Owns the background delivery task of one open conversation view.
pub struct ChannelHandle {
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ChannelHandle {
    fn new(cancel: CancellationToken, task: tokio::task::JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Cancels the delivery task and waits for it to finish.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        // The task notices the cancellation at its next trigger.
        self.cancel.cancel();
    }
}

/// Periodic full-list fetches: once immediately on open, then on a fixed
/// interval. Each tick also refreshes the conversation status.
pub struct PollChannel {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    interval: Duration,
}

impl PollChannel {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            conversations,
            messages,
            interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// Like [`PollChannel::new`] with an explicit interval, for
    /// embedders that tune polling below one-second granularity.
    pub fn with_interval(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        interval: Duration,
    ) -> Self {
        Self {
            conversations,
            messages,
            interval,
        }
    }
}

#[async_trait]
impl DeliveryChannel for PollChannel {
    async fn open(
        &self,
        conversation: &Conversation,
        events: mpsc::Sender<DeliveryEvent>,
    ) -> Result<ChannelHandle, ChatError> {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            self.conversations.clone(),
            self.messages.clone(),
            conversation.clone(),
            events,
            self.interval,
            cancel.clone(),
        ));
        info!(
            ref_code = conversation.ref_code.as_str(),
            interval_secs = self.interval.as_secs(),
            "poll delivery started"
        );
        Ok(ChannelHandle::new(cancel, task))
    }
}

async fn poll_loop(
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    conversation: Conversation,
    events: mpsc::Sender<DeliveryEvent>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            // The first tick completes immediately: fetch-on-open.
            _ = ticker.tick() => {
                match messages.list_by_conversation(&conversation.id).await {
                    Ok(list) => {
                        if events.send(DeliveryEvent::Snapshot(list)).await.is_err() {
                            break;
                        }
                    }
                    // Skipped tick: prior visible state stays untouched.
                    Err(e) => debug!(error = %e, "poll fetch failed, retrying next tick"),
                }
                match conversations.get_by_ref_code(&conversation.ref_code).await {
                    Ok(Some(current)) => {
                        if events.send(DeliveryEvent::Status(current.status)).await.is_err() {
                            break;
                        }
                    }
                    // A vanished record degrades to an unchanged view.
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "poll status fetch failed"),
                }
            }
        }
    }
    debug!(ref_code = conversation.ref_code.as_str(), "poll delivery stopped");
}

/// Change-feed subscription: one initial snapshot, then single inserts
/// and status changes as they happen.
pub struct PushChannel {
    messages: Arc<dyn MessageStore>,
}

impl PushChannel {
    pub fn new(messages: Arc<dyn MessageStore>) -> Self {
        Self { messages }
    }
}

#[async_trait]
impl DeliveryChannel for PushChannel {
    async fn open(
        &self,
        conversation: &Conversation,
        events: mpsc::Sender<DeliveryEvent>,
    ) -> Result<ChannelHandle, ChatError> {
        // Subscribe before the initial fetch so no insert lands in the gap.
        let feed = self.messages.subscribe(&conversation.id);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(push_loop(
            self.messages.clone(),
            conversation.clone(),
            feed,
            events,
            cancel.clone(),
        ));
        info!(
            ref_code = conversation.ref_code.as_str(),
            "push delivery started"
        );
        Ok(ChannelHandle::new(cancel, task))
    }
}

async fn push_loop(
    messages: Arc<dyn MessageStore>,
    conversation: Conversation,
    mut feed: broadcast::Receiver<ConversationEvent>,
    events: mpsc::Sender<DeliveryEvent>,
    cancel: CancellationToken,
) {
    match messages.list_by_conversation(&conversation.id).await {
        Ok(list) => {
            if events.send(DeliveryEvent::Snapshot(list)).await.is_err() {
                return;
            }
        }
        Err(e) => debug!(error = %e, "initial snapshot fetch failed"),
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = feed.recv() => match event {
                Ok(ConversationEvent::Message(message)) => {
                    if events.send(DeliveryEvent::Inserted(message)).await.is_err() {
                        break;
                    }
                }
                Ok(ConversationEvent::StatusChanged(status)) => {
                    if events.send(DeliveryEvent::Status(status)).await.is_err() {
                        break;
                    }
                }
                // Fell behind the feed buffer: recover with a snapshot.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "push feed lagged, refetching snapshot");
                    match messages.list_by_conversation(&conversation.id).await {
                        Ok(list) => {
                            if events.send(DeliveryEvent::Snapshot(list)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!(error = %e, "lag recovery fetch failed"),
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("push feed closed");
                    break;
                }
            }
        }
    }
    debug!(ref_code = conversation.ref_code.as_str(), "push delivery stopped");
}
