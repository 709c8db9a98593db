// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session, reconciliation, lifecycle, and delivery engine for the
//! Stonegate support chat.
//!
//! The crate is organized around one conversation view at a time:
//! - [`LifecycleController`] mints and resumes conversations and keeps
//!   the [`SessionStore`] and [`HistoryLedger`] in step
//! - a [`DeliveryChannel`] (poll or push) feeds authoritative state in
//! - the [`Reconciler`] merges it with optimistic local sends
//! - [`ChatView`] is the single task all of it funnels through

pub mod channel;
pub mod history;
pub mod lifecycle;
pub mod reconcile;
pub mod session;
pub mod view;

pub use channel::{ChannelHandle, DeliveryChannel, DeliveryEvent, PollChannel, PushChannel};
pub use history::{HistoryEntry, HistoryLedger};
pub use lifecycle::LifecycleController;
pub use reconcile::{merge, OutgoingDraft, PendingMessage, Reconciler, ViewMessage};
pub use session::{ActiveSession, SessionSnapshot, SessionStore};
pub use view::{ChatView, ChatViewHandle, ChatViewState};
