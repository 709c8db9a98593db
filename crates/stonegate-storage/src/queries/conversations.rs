// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD operations.

use rusqlite::params;
use stonegate_core::{
    ChatError, Conversation, ConversationId, ConversationStatus, RefCode,
};

use crate::database::{map_create_err, map_tr_err, Database};
use crate::queries::{format_ts, parse_enum, parse_ts};

pub(crate) fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let ref_code: String = row.get(1)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let last_activity_at: String = row.get(6)?;
    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        // Stored codes were normalized on the way in.
        ref_code: RefCode::normalize(&ref_code)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::other(e.to_string())),
            ))?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        status: parse_enum::<ConversationStatus>(4, &status)?,
        created_at: parse_ts(5, &created_at)?,
        last_activity_at: parse_ts(6, &last_activity_at)?,
        last_message_preview: row.get(7)?,
    })
}

const CONVERSATION_COLUMNS: &str = "id, ref_code, customer_name, customer_phone, status, \
     created_at, last_activity_at, last_message_preview";

/// Insert a new conversation.
///
/// The unique index on `ref_code` turns duplicate codes into
/// [`ChatError::CodeConflict`].
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), ChatError> {
    let c = conversation.clone();
    let code = conversation.ref_code.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, ref_code, customer_name, customer_phone, status,
                     created_at, last_activity_at, last_message_preview)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    c.id.0,
                    c.ref_code.as_str(),
                    c.customer_name,
                    c.customer_phone,
                    c.status.to_string(),
                    format_ts(&c.created_at),
                    format_ts(&c.last_activity_at),
                    c.last_message_preview,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| map_create_err(e, &code))
}

/// Get a conversation by exact reference code.
pub async fn get_by_ref_code(
    db: &Database,
    code: &RefCode,
) -> Result<Option<Conversation>, ChatError> {
    let code = code.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE ref_code = ?1"
            ))?;
            let result = stmt.query_row(params![code], row_to_conversation);
            match result {
                Ok(conversation) => Ok(Some(conversation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Update a conversation's lifecycle status, returning the updated record.
pub async fn update_status(
    db: &Database,
    id: &ConversationId,
    status: ConversationStatus,
) -> Result<Option<Conversation>, ChatError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_conversation);
            match result {
                Ok(conversation) => Ok(Some(conversation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List conversations, optionally filtered by status, most recently
/// active first.
pub async fn list_conversations(
    db: &Database,
    status: Option<ConversationStatus>,
) -> Result<Vec<Conversation>, ChatError> {
    db.connection()
        .call(move |conn| {
            let mut conversations = Vec::new();
            match status {
                Some(filter) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations
                         WHERE status = ?1 ORDER BY last_activity_at DESC"
                    ))?;
                    let rows = stmt.query_map(params![filter.to_string()], row_to_conversation)?;
                    for row in rows {
                        conversations.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations
                         ORDER BY last_activity_at DESC"
                    ))?;
                    let rows = stmt.query_map([], row_to_conversation)?;
                    for row in rows {
                        conversations.push(row?);
                    }
                }
            }
            Ok(conversations)
        })
        .await
        .map_err(map_tr_err)
}
