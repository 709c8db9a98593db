// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification cue trait.

/// Fire-and-forget audio cue for newly arrived counterpart messages.
///
/// Implementations must swallow playback failures (autoplay restrictions
/// and the like) -- a failed cue is never surfaced as an error.
pub trait NotificationCue: Send + Sync {
    fn play(&self);
}
