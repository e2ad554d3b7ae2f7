//! The persistence contract the real-time core depends on.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use stayhub_core::config::{DatabaseConfig, DatabaseProvider};
use stayhub_core::result::AppResult;
use stayhub_core::types::{ConversationBookingId, MessageId, UserId};
use stayhub_entity::expiry::ExpirableKind;
use stayhub_entity::message::{Message, MessageDetail, NewMessage};
use stayhub_entity::notification::{NewNotification, Notification};

use crate::connection::DatabasePool;
use crate::memory::MemoryGateway;
use crate::migration;
use crate::postgres::PgGateway;

/// New value for a conversation's denormalized last-message pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMessagePointer {
    /// Most recent message.
    pub message_id: MessageId,
    /// Its creation time.
    pub at: DateTime<Utc>,
}

impl LastMessagePointer {
    /// Pointer at the given message.
    pub fn at_message(message: &Message) -> Self {
        Self {
            message_id: message.id.clone(),
            at: message.created_at,
        }
    }

    /// Whether this pointer may replace `current`. The pointer never moves
    /// back in time.
    pub fn supersedes(&self, current: Option<DateTime<Utc>>) -> bool {
        current.is_none_or(|at| at <= self.at)
    }
}

/// Filter for messages a user has not yet seen in one conversation-booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadQuery {
    /// Conversation-booking to look in.
    pub conversation_booking_id: ConversationBookingId,
    /// Messages from this sender are never unread for them.
    pub exclude_sender_id: UserId,
    /// Reader whose receipts are checked.
    pub user_id: UserId,
}

impl UnreadQuery {
    /// Unread messages for `user_id`, excluding the user's own messages.
    pub fn for_reader(user_id: UserId, conversation_booking_id: ConversationBookingId) -> Self {
        Self {
            conversation_booking_id,
            exclude_sender_id: user_id.clone(),
            user_id,
        }
    }
}

/// A read receipt to insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewMessageRead {
    /// Seen message.
    pub message_id: MessageId,
    /// Reader.
    pub user_id: UserId,
}

/// Transactional data-access facade over conversations, messages, read
/// receipts, notifications and expirable records.
#[async_trait]
pub trait PersistenceGateway: Send + Sync + Debug + 'static {
    /// Persist a message and move its conversation's last-message pointer
    /// to it as one unit of work.
    ///
    /// Either both writes land or neither does. The returned detail has
    /// sender, receipts and conversation-booking (plus conversation, with
    /// the advanced pointer) resolved.
    async fn create_message_and_advance(&self, new: &NewMessage) -> AppResult<MessageDetail>;

    /// Messages matching `query`, oldest first.
    async fn find_unread_messages(&self, query: &UnreadQuery) -> AppResult<Vec<Message>>;

    /// Insert read receipts, silently skipping pairs that already exist.
    /// Returns the number of rows actually inserted.
    async fn bulk_insert_reads(&self, rows: &[NewMessageRead]) -> AppResult<u64>;

    /// Store a notification.
    async fn create_notification(&self, new: &NewNotification) -> AppResult<Notification>;

    /// Transition every record of `kind` still in its pending status with a
    /// deadline before `now` to the expired status. Returns the row count.
    async fn expire_pending(&self, kind: ExpirableKind, now: DateTime<Utc>) -> AppResult<u64>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Build the gateway selected by configuration.
pub async fn connect_gateway(config: &DatabaseConfig) -> AppResult<Arc<dyn PersistenceGateway>> {
    match config.provider {
        DatabaseProvider::Postgres => {
            let pool = DatabasePool::connect(config).await?;
            if config.run_migrations {
                migration::run_migrations(pool.pool()).await?;
            }
            Ok(Arc::new(PgGateway::new(pool)))
        }
        DatabaseProvider::Memory => {
            info!("Using in-memory persistence gateway");
            Ok(Arc::new(MemoryGateway::new()))
        }
    }
}
