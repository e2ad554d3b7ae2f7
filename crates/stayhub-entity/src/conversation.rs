//! Conversation threads and their booking bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stayhub_core::types::{BookingId, ConversationBookingId, ConversationId, MessageId, UserId};

/// An ongoing thread tied to one property/booking context.
///
/// `last_message_id` / `last_message_at` always point at the most recently
/// persisted message across every conversation-booking of the thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// Users taking part in the thread.
    pub participant_ids: Vec<UserId>,
    /// Most recent message.
    pub last_message_id: Option<MessageId>,
    /// Creation time of the most recent message.
    pub last_message_at: Option<DateTime<Utc>>,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
}

/// Binds a conversation to one booking; a thread may span several bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversationBooking {
    /// Unique identifier, also the socket room suffix.
    pub id: ConversationBookingId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Bound booking.
    pub booking_id: BookingId,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

/// A conversation-booking with its parent conversation resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationBookingDetail {
    /// The binding itself.
    #[serde(flatten)]
    pub booking: ConversationBooking,
    /// Parent conversation.
    pub conversation: Conversation,
}
