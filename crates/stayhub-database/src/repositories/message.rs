//! Message and read-receipt repository.

use sqlx::{PgConnection, PgPool};

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_core::types::{MessageId, UserId};
use stayhub_entity::message::{Message, MessageRead, NewMessage};

use crate::gateway::{NewMessageRead, UnreadQuery};

/// Repository for chat messages and their read receipts.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a message on the caller's connection.
    pub async fn insert(conn: &mut PgConnection, new: &NewMessage) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, conversation_booking_id, sender_id, text) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(MessageId::generate())
        .bind(&new.conversation_booking_id)
        .bind(&new.sender_id)
        .bind(&new.text)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create message", e))
    }

    /// Read receipts recorded for a message.
    pub async fn find_reads(&self, message_id: &MessageId) -> AppResult<Vec<MessageRead>> {
        sqlx::query_as::<_, MessageRead>(
            "SELECT * FROM message_reads WHERE message_id = $1 ORDER BY read_at ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list reads", e))
    }

    /// Messages the reader has not seen, excluding their own.
    pub async fn find_unread(&self, query: &UnreadQuery) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT m.* FROM messages m \
             WHERE m.conversation_booking_id = $1 AND m.sender_id <> $2 \
             AND NOT EXISTS ( \
                 SELECT 1 FROM message_reads r WHERE r.message_id = m.id AND r.user_id = $3 \
             ) \
             ORDER BY m.created_at ASC",
        )
        .bind(&query.conversation_booking_id)
        .bind(&query.exclude_sender_id)
        .bind(&query.user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find unread messages", e)
        })
    }

    /// Insert read receipts, skipping existing pairs.
    pub async fn bulk_insert_reads(&self, rows: &[NewMessageRead]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let message_ids: Vec<MessageId> = rows.iter().map(|r| r.message_id.clone()).collect();
        let user_ids: Vec<UserId> = rows.iter().map(|r| r.user_id.clone()).collect();

        let result = sqlx::query(
            "INSERT INTO message_reads (message_id, user_id) \
             SELECT * FROM UNNEST($1::text[], $2::text[]) \
             ON CONFLICT (message_id, user_id) DO NOTHING",
        )
        .bind(&message_ids)
        .bind(&user_ids)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert reads", e))?;

        Ok(result.rows_affected())
    }
}
