//! Shared domain types.

pub mod id;

pub use id::{
    BookingId, ConversationBookingId, ConversationId, MessageId, NotificationId, UserId,
};
