//! # stayhub-entity
//!
//! Domain entity models for the StayHub real-time core: user summaries,
//! conversations bound to bookings, chat messages with read receipts,
//! durable notifications, and the time-bound entity kinds swept by the
//! expiry job.

pub mod conversation;
pub mod expiry;
pub mod message;
pub mod notification;
pub mod user;

pub use conversation::{Conversation, ConversationBooking, ConversationBookingDetail};
pub use expiry::ExpirableKind;
pub use message::{Message, MessageDetail, MessageRead, NewMessage};
pub use notification::{NewNotification, Notification, NotificationData};
pub use user::UserSummary;
