// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media handling for the Stonegate support chat.
//!
//! The attachment pipeline turns captured bytes into durable
//! [`stonegate_core::MediaRef`]s before message composition; the
//! filesystem object store is the stock deployment's storage
//! collaborator; the voice recorder models capture state for voice
//! notes.

pub mod fsstore;
pub mod pipeline;
pub mod recorder;

pub use fsstore::FsObjectStore;
pub use pipeline::MediaPipeline;
pub use recorder::{CapturedAudio, RecorderState, VoiceRecorder};
