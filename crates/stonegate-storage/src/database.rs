// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use stonegate_core::ChatError;
use tracing::debug;

/// Handle to the single SQLite connection.
///
/// Query modules accept `&Database` and call through `connection().call()`;
/// tokio-rusqlite serializes all closures on one background thread, which
/// eliminates SQLITE_BUSY errors under concurrent access.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (or creates) the database at `path`, applies PRAGMAs, and
    /// runs pending migrations.
    pub async fn open(path: &str) -> Result<Self, ChatError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ChatError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), ChatError> {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| ChatError::Storage {
                    source: Box::new(e),
                })?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(|e| ChatError::Storage {
                    source: Box::new(e),
                })?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(|e| ChatError::Storage {
                    source: Box::new(e),
                })?;
            crate::migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(chat_err) => chat_err,
            other => ChatError::Storage {
                source: Box::new(other),
            },
        })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ChatError {
    ChatError::Storage {
        source: Box::new(e),
    }
}

/// Map a tokio-rusqlite error, translating unique-index violations on
/// conversation creation into [`ChatError::CodeConflict`].
pub(crate) fn map_create_err(e: tokio_rusqlite::Error, code: &str) -> ChatError {
    if let tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(inner, _)) = &e {
        if inner.code == rusqlite::ErrorCode::ConstraintViolation {
            return ChatError::CodeConflict {
                code: code.to_string(),
            };
        }
    }
    map_tr_err(e)
}
