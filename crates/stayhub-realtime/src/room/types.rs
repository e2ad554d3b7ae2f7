//! Room naming.

use std::fmt;

use stayhub_core::types::{ConversationBookingId, UserId};

/// Room every admin session joins to observe all chat traffic.
pub const ADMIN_ROOM: &str = "admin_room";

const USER_PREFIX: &str = "user-";
const CONVERSATION_PREFIX: &str = "conversation-";

/// Typed view of a room name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKind {
    /// `admin_room`.
    Admin,
    /// `user-{userId}`: personal notifications.
    User(UserId),
    /// `conversation-{conversationBookingId}`: one chat thread.
    Conversation(ConversationBookingId),
    /// Any other client-chosen room.
    Named(String),
}

impl RoomKind {
    /// Classify a room name.
    pub fn parse(name: &str) -> Self {
        if name == ADMIN_ROOM {
            return Self::Admin;
        }
        if let Some(id) = name.strip_prefix(USER_PREFIX).filter(|id| !id.is_empty()) {
            return Self::User(UserId::new(id));
        }
        if let Some(id) = name
            .strip_prefix(CONVERSATION_PREFIX)
            .filter(|id| !id.is_empty())
        {
            return Self::Conversation(ConversationBookingId::new(id));
        }
        Self::Named(name.to_string())
    }

    /// The room name.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str(ADMIN_ROOM),
            Self::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Self::Conversation(id) => write!(f, "{CONVERSATION_PREFIX}{id}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}
