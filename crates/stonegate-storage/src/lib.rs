// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Stonegate support chat.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, typed CRUD for
//! conversations and messages, per-conversation broadcast feeds for
//! push-mode delivery, and a JSON-file device-local key-value store.

pub mod adapter;
pub mod database;
pub mod localstore;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
pub use localstore::FileStore;
