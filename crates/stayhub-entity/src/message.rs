//! Chat messages and read receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stayhub_core::types::{ConversationBookingId, MessageId, UserId};

use crate::conversation::ConversationBookingDetail;
use crate::user::UserSummary;

/// One chat utterance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Owning conversation-booking.
    pub conversation_booking_id: ConversationBookingId,
    /// Author.
    pub sender_id: UserId,
    /// Body, stored as sent (may be empty).
    pub text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Author.
    pub sender_id: UserId,
    /// Body.
    pub text: String,
    /// Target conversation-booking.
    pub conversation_booking_id: ConversationBookingId,
}

/// "User X has seen message Y". At most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRead {
    /// Message that was seen.
    pub message_id: MessageId,
    /// Reader.
    pub user_id: UserId,
    /// When the receipt was recorded.
    pub read_at: DateTime<Utc>,
}

/// A message with sender, receipts and conversation eagerly resolved.
///
/// This is the payload of the `message` socket event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    /// The message row.
    #[serde(flatten)]
    pub message: Message,
    /// Author profile.
    pub sender: UserSummary,
    /// Existing read receipts.
    pub reads: Vec<MessageRead>,
    /// Owning conversation-booking with its conversation.
    pub conversation_booking: ConversationBookingDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Conversation, ConversationBooking};
    use stayhub_core::types::{BookingId, ConversationId};

    #[test]
    fn test_detail_serializes_flat_camel_case() {
        let now = Utc::now();
        let detail = MessageDetail {
            message: Message {
                id: MessageId::new("m1"),
                conversation_booking_id: ConversationBookingId::new("42"),
                sender_id: UserId::new("u1"),
                text: "hi".to_string(),
                created_at: now,
            },
            sender: UserSummary::bare(UserId::new("u1")),
            reads: Vec::new(),
            conversation_booking: ConversationBookingDetail {
                booking: ConversationBooking {
                    id: ConversationBookingId::new("42"),
                    conversation_id: ConversationId::new("c1"),
                    booking_id: BookingId::new("b1"),
                    created_at: now,
                },
                conversation: Conversation {
                    id: ConversationId::new("c1"),
                    participant_ids: vec![UserId::new("u1"), UserId::new("u2")],
                    last_message_id: None,
                    last_message_at: None,
                    created_at: now,
                },
            },
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "m1");
        assert_eq!(json["conversationBookingId"], "42");
        assert_eq!(json["senderId"], "u1");
        assert_eq!(json["sender"]["id"], "u1");
        assert_eq!(json["conversationBooking"]["conversationId"], "c1");
        assert_eq!(json["conversationBooking"]["conversation"]["id"], "c1");
    }
}
