use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};
use sqlx::{FromRow, Row, SqliteConnection};

use crate::db_types::{new_document_id, ChatMessage, Conversation, ConversationId, NewMessage, UserId};

/// Claims the next message slot in the conversation, creating the conversation document on first contact.
///
/// This is the first statement of every send, and being a write it serializes concurrent sends to the same
/// conversation. Returns the conversation as it was before the new message, and the sequence number reserved for it.
pub(crate) async fn reserve_message_slot(
    id: &ConversationId,
    participants: [(UserId, String); 2],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Conversation, i64), sqlx::Error> {
    let [(a, name_a), (b, name_b)] = participants;
    let ((a, name_a), (b, name_b)) = if a <= b { ((a, name_a), (b, name_b)) } else { ((b, name_b), (a, name_a)) };
    let row = sqlx::query(
        r#"
            INSERT INTO conversations (id, participant_a, participant_b, name_a, name_b, message_count, created_at)
            VALUES ($1, $2, $3, $4, $5, 1, $6)
            ON CONFLICT (id) DO UPDATE SET
                message_count = message_count + 1,
                name_a = CASE WHEN name_a = '' THEN excluded.name_a ELSE name_a END,
                name_b = CASE WHEN name_b = '' THEN excluded.name_b ELSE name_b END
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(a)
    .bind(b)
    .bind(name_a)
    .bind(name_b)
    .bind(now)
    .fetch_one(conn)
    .await?;
    let conversation = Conversation::from_row(&row)?;
    let seq: i64 = row.try_get("message_count")?;
    trace!("🗃️ Reserved slot {seq} in conversation {id}");
    Ok((conversation, seq))
}

/// The store clock for a new message: now, unless that would not be strictly after the previous message.
pub(crate) fn next_message_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::milliseconds(1),
        _ => now,
    }
}

pub(crate) async fn insert_message(
    id: &ConversationId,
    seq: i64,
    message: NewMessage,
    timestamp: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ChatMessage, sqlx::Error> {
    let message: ChatMessage = sqlx::query_as(
        r#"
            INSERT INTO messages (id, conversation_id, seq, sender_id, sender_name, text, attachment_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(new_document_id())
    .bind(id)
    .bind(seq)
    .bind(message.sender_id)
    .bind(message.sender_name)
    .bind(message.text)
    .bind(message.attachment_url)
    .bind(timestamp)
    .fetch_one(conn)
    .await?;
    Ok(message)
}

pub(crate) async fn update_summary(
    id: &ConversationId,
    message: &ChatMessage,
    summary_text: String,
    conn: &mut SqliteConnection,
) -> Result<Conversation, sqlx::Error> {
    let conversation: Conversation = sqlx::query_as(
        r#"
            UPDATE conversations SET last_message = $1, last_message_at = $2, last_sender_id = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(summary_text)
    .bind(message.timestamp)
    .bind(&message.sender_id)
    .bind(id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Conversation {id} now at message #{} from {}", message.seq, message.sender_id);
    Ok(conversation)
}

pub async fn fetch_conversation(
    id: &ConversationId,
    conn: &mut SqliteConnection,
) -> Result<Option<Conversation>, sqlx::Error> {
    let conversation =
        sqlx::query_as("SELECT * FROM conversations WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(conversation)
}

pub async fn fetch_conversations_for(
    user: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let conversations = sqlx::query_as(
        r#"
            SELECT * FROM conversations
            WHERE participant_a = $1 OR participant_b = $1
            ORDER BY last_message_at DESC NULLS LAST, id ASC
        "#,
    )
    .bind(user)
    .fetch_all(conn)
    .await?;
    Ok(conversations)
}

/// Messages in display order. Timestamps are strictly increasing per conversation, so `seq` only guards against
/// legacy rows with equal times.
pub async fn fetch_messages(id: &ConversationId, conn: &mut SqliteConnection) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let messages =
        sqlx::query_as("SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, seq ASC")
            .bind(id)
            .fetch_all(conn)
            .await?;
    Ok(messages)
}
