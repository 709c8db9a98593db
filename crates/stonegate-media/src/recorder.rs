// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice-note capture state.
//!
//! A two-state toggle (idle <-> recording) fed with encoded audio
//! chunks. Stopping always yields the captured bytes, even when nothing
//! was fed -- an empty capture is left to fail at attach time instead of
//! being special-cased here.

use std::time::{Duration, Instant};

/// States of the capture toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

impl std::fmt::Display for RecorderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecorderState::Idle => write!(f, "idle"),
            RecorderState::Recording => write!(f, "recording"),
        }
    }
}

/// The bytes and duration of a finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub duration: Duration,
}

/// Accumulates encoded audio chunks between `start` and `stop`.
#[derive(Debug, Default)]
pub struct VoiceRecorder {
    started_at: Option<Instant>,
    chunks: Vec<u8>,
}

impl VoiceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        if self.started_at.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Begins a capture. A no-op when already recording.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            self.chunks.clear();
        }
    }

    /// Appends an encoded audio chunk. Ignored while idle.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.started_at.is_some() {
            self.chunks.extend_from_slice(chunk);
        }
    }

    /// Time since the capture began, for the elapsed display.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// Elapsed time formatted `M:SS` for the widget's timer label.
    pub fn elapsed_label(&self) -> Option<String> {
        self.elapsed().map(|d| {
            let secs = d.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        })
    }

    /// Ends the capture, returning whatever was collected.
    ///
    /// Returns `None` only when no capture was in progress.
    pub fn stop(&mut self) -> Option<CapturedAudio> {
        let started_at = self.started_at.take()?;
        Some(CapturedAudio {
            bytes: std::mem::take(&mut self.chunks),
            duration: started_at.elapsed(),
        })
    }
}
