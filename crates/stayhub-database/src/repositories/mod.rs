//! Concrete PostgreSQL repositories, one per entity family.

pub mod conversation;
pub mod expiry;
pub mod message;
pub mod notification;
pub mod user;

pub use conversation::ConversationRepository;
pub use expiry::ExpiryRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;
