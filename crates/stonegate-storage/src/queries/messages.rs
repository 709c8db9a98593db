// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use rusqlite::params;
use stonegate_core::{
    ChatError, ConversationId, MediaKind, MediaRef, MessageId, RefCode, SenderRole,
    StoredMessage,
};

use crate::database::{map_tr_err, Database};
use crate::queries::{format_ts, parse_enum, parse_ts};

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let ref_code: String = row.get(2)?;
    let sender_role: String = row.get(3)?;
    let created_at: String = row.get(8)?;
    let media_url: Option<String> = row.get(6)?;
    let media_kind: Option<String> = row.get(7)?;

    let media = match (media_url, media_kind) {
        (Some(url), Some(kind)) => Some(MediaRef {
            url,
            kind: parse_enum::<MediaKind>(7, &kind)?,
        }),
        _ => None,
    };

    Ok(StoredMessage {
        id: MessageId(row.get(0)?),
        conversation_id: ConversationId(row.get(1)?),
        ref_code: RefCode::normalize(&ref_code).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::other(e.to_string())),
            )
        })?,
        sender_role: parse_enum::<SenderRole>(3, &sender_role)?,
        sender_name: row.get(4)?,
        text: row.get(5)?,
        media,
        created_at: parse_ts(8, &created_at)?,
        read: row.get(9)?,
    })
}

const MESSAGE_COLUMNS: &str = "id, conversation_id, ref_code, sender_role, sender_name, \
     body, media_url, media_kind, created_at, read";

/// Insert a message and bump the parent conversation's activity marker
/// and preview in the same writer call.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<(), ChatError> {
    let msg = msg.clone();
    let preview = msg.preview();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, ref_code, sender_role, sender_name,
                     body, media_url, media_kind, created_at, read)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    msg.id.0,
                    msg.conversation_id.0,
                    msg.ref_code.as_str(),
                    msg.sender_role.to_string(),
                    msg.sender_name,
                    msg.text,
                    msg.media.as_ref().map(|m| m.url.clone()),
                    msg.media.as_ref().map(|m| m.kind.to_string()),
                    format_ts(&msg.created_at),
                    msg.read,
                ],
            )?;
            conn.execute(
                "UPDATE conversations SET last_activity_at = ?1, last_message_preview = ?2
                 WHERE id = ?3",
                params![format_ts(&msg.created_at), preview, msg.conversation_id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get all messages of a conversation in chronological order.
///
/// Ties on `created_at` fall back to insertion order via rowid.
pub async fn list_by_conversation(
    db: &Database,
    id: &ConversationId,
) -> Result<Vec<StoredMessage>, ChatError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![id], row_to_message)?;
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark every message authored by `sender_role` in the conversation as read.
pub async fn mark_read(
    db: &Database,
    id: &ConversationId,
    sender_role: SenderRole,
) -> Result<(), ChatError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET read = 1
                 WHERE conversation_id = ?1 AND sender_role = ?2",
                params![id, sender_role.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
