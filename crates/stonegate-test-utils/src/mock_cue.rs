// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification cue that counts plays instead of making noise.

use std::sync::atomic::{AtomicUsize, Ordering};

use stonegate_core::NotificationCue;

/// [`NotificationCue`] recording how often it fired.
#[derive(Default)]
pub struct RecordingCue {
    plays: AtomicUsize,
}

impl RecordingCue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl NotificationCue for RecordingCue {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}
