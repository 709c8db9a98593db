// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory mock collaborators for deterministic Stonegate tests.
//!
//! Each mock implements one of the `stonegate-core` traits with
//! injectable failures and captured effects for assertion.

pub mod mock_cue;
pub mod mock_local;
pub mod mock_media;
pub mod mock_store;

pub use mock_cue::RecordingCue;
pub use mock_local::MemoryLocalStore;
pub use mock_media::{CapturedUpload, MemoryObjectStore};
pub use mock_store::MemoryStore;
