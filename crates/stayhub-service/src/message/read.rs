//! Read receipts.

use std::sync::Arc;

use tracing::debug;

use stayhub_core::error::AppError;
use stayhub_core::result::AppResult;
use stayhub_core::types::{ConversationBookingId, MessageId, UserId};
use stayhub_database::gateway::{NewMessageRead, PersistenceGateway, UnreadQuery};

use crate::locks::KeyedLocks;

/// Result of marking a conversation-booking as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Messages that were unread before the call, oldest first.
    pub message_ids: Vec<MessageId>,
    /// Receipts actually inserted.
    pub inserted: u64,
}

impl ReadOutcome {
    /// Whether there was nothing to mark.
    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}

/// Records which messages a user has seen.
#[derive(Debug, Clone)]
pub struct ReadReceiptService {
    /// Persistence gateway.
    gateway: Arc<dyn PersistenceGateway>,
    /// Serialises read-marking per (reader, conversation-booking).
    locks: Arc<KeyedLocks<(UserId, ConversationBookingId)>>,
}

impl ReadReceiptService {
    /// Creates a new read receipt service.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Mark every message in the conversation-booking that `user_id` did
    /// not send and has not yet seen as read.
    ///
    /// Returns an empty outcome when there was nothing unread.
    pub async fn mark_as_read(
        &self,
        user_id: &UserId,
        conversation_booking_id: &ConversationBookingId,
    ) -> AppResult<ReadOutcome> {
        if user_id.is_blank() {
            return Err(AppError::validation("userId is required"));
        }
        if conversation_booking_id.is_blank() {
            return Err(AppError::validation("conversationBookingId is required"));
        }

        let _guard = self
            .locks
            .lock(&(user_id.clone(), conversation_booking_id.clone()))
            .await;

        let unread = self
            .gateway
            .find_unread_messages(&UnreadQuery::for_reader(
                user_id.clone(),
                conversation_booking_id.clone(),
            ))
            .await?;

        if unread.is_empty() {
            return Ok(ReadOutcome::default());
        }

        let rows: Vec<NewMessageRead> = unread
            .iter()
            .map(|m| NewMessageRead {
                message_id: m.id.clone(),
                user_id: user_id.clone(),
            })
            .collect();
        let inserted = self.gateway.bulk_insert_reads(&rows).await?;

        debug!(
            user_id = %user_id,
            conversation_booking_id = %conversation_booking_id,
            unread = rows.len(),
            inserted,
            "Messages marked as read"
        );

        Ok(ReadOutcome {
            message_ids: unread.into_iter().map(|m| m.id).collect(),
            inserted,
        })
    }
}
