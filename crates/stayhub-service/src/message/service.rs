//! Message persistence with the conversation's last-message pointer.

use std::sync::Arc;

use tracing::{debug, error};

use stayhub_core::error::AppError;
use stayhub_core::result::AppResult;
use stayhub_core::types::{ConversationBookingId, UserId};
use stayhub_database::gateway::PersistenceGateway;
use stayhub_entity::message::{MessageDetail, NewMessage};

use crate::locks::KeyedLocks;

/// Saves chat messages.
#[derive(Debug, Clone)]
pub struct MessageService {
    /// Persistence gateway.
    gateway: Arc<dyn PersistenceGateway>,
    /// Serialises saves per conversation-booking.
    locks: Arc<KeyedLocks<ConversationBookingId>>,
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Persist a message and move the parent conversation's last-message
    /// pointer to it.
    ///
    /// The two writes are atomic: if the pointer cannot be moved no message
    /// is stored and the call fails. The returned detail carries the
    /// updated pointer.
    pub async fn save_message(
        &self,
        sender_id: &UserId,
        text: &str,
        conversation_booking_id: &ConversationBookingId,
    ) -> AppResult<MessageDetail> {
        if sender_id.is_blank() {
            return Err(AppError::validation("senderId is required"));
        }
        if conversation_booking_id.is_blank() {
            return Err(AppError::validation("conversationBookingId is required"));
        }

        let _guard = self.locks.lock(conversation_booking_id).await;

        let new = NewMessage {
            sender_id: sender_id.clone(),
            text: text.to_string(),
            conversation_booking_id: conversation_booking_id.clone(),
        };
        let detail = match self.gateway.create_message_and_advance(&new).await {
            Ok(detail) => detail,
            Err(e) => {
                error!(
                    conversation_booking_id = %conversation_booking_id,
                    sender_id = %sender_id,
                    error = %e,
                    "Failed to save message"
                );
                return Err(e);
            }
        };

        debug!(
            message_id = %detail.message.id,
            conversation_id = %detail.conversation_booking.conversation.id,
            "Message saved"
        );

        Ok(detail)
    }
}
