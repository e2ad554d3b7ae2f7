//! Conversation and conversation-booking repository.

use sqlx::PgConnection;

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_core::types::{ConversationBookingId, ConversationId};
use stayhub_entity::conversation::{Conversation, ConversationBooking, ConversationBookingDetail};

use crate::gateway::LastMessagePointer;

/// Queries over conversation threads and their booking bindings.
///
/// Every query runs on a connection supplied by the caller so that it can
/// take part in the caller's transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationRepository;

impl ConversationRepository {
    /// Find a conversation-booking with its parent conversation, holding a
    /// row lock on the conversation until the surrounding transaction ends.
    pub async fn lock_booking_detail(
        conn: &mut PgConnection,
        id: &ConversationBookingId,
    ) -> AppResult<Option<ConversationBookingDetail>> {
        let booking = sqlx::query_as::<_, ConversationBooking>(
            "SELECT * FROM conversation_bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to find conversation booking",
                e,
            )
        })?;

        let Some(booking) = booking else {
            return Ok(None);
        };

        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE id = $1 FOR UPDATE",
        )
        .bind(&booking.conversation_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock conversation", e))?
        .ok_or_else(|| {
            AppError::database(format!(
                "Conversation booking {} references missing conversation {}",
                booking.id, booking.conversation_id
            ))
        })?;

        Ok(Some(ConversationBookingDetail {
            booking,
            conversation,
        }))
    }

    /// Move the last-message pointer forward.
    ///
    /// An update carrying an older timestamp than the stored one is a
    /// no-op. Returns whether the pointer moved.
    pub async fn advance_last_message(
        conn: &mut PgConnection,
        id: &ConversationId,
        pointer: &LastMessagePointer,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE conversations SET last_message_id = $2, last_message_at = $3 \
             WHERE id = $1 AND (last_message_at IS NULL OR last_message_at <= $3)",
        )
        .bind(id)
        .bind(&pointer.message_id)
        .bind(pointer.at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update conversation", e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}
