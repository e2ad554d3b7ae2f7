//! PostgreSQL-backed persistence gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_entity::expiry::ExpirableKind;
use stayhub_entity::message::{Message, MessageDetail, NewMessage};
use stayhub_entity::notification::{NewNotification, Notification};
use stayhub_entity::user::UserSummary;

use crate::connection::DatabasePool;
use crate::gateway::{LastMessagePointer, NewMessageRead, PersistenceGateway, UnreadQuery};
use crate::repositories::{
    ConversationRepository, ExpiryRepository, MessageRepository, NotificationRepository,
    UserRepository,
};

/// Gateway composed from the per-entity PostgreSQL repositories.
#[derive(Debug, Clone)]
pub struct PgGateway {
    /// Shared pool, used for transactions and health checks.
    db: DatabasePool,
    /// Message repository.
    messages: MessageRepository,
    /// User repository.
    users: UserRepository,
    /// Notification repository.
    notifications: NotificationRepository,
    /// Expiry repository.
    expiry: ExpiryRepository,
}

impl PgGateway {
    /// Create a gateway over an open pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            messages: MessageRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            expiry: ExpiryRepository::new(pool),
            db,
        }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn create_message_and_advance(&self, new: &NewMessage) -> AppResult<MessageDetail> {
        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut conversation_booking =
            ConversationRepository::lock_booking_detail(&mut *tx, &new.conversation_booking_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!(
                        "Conversation booking {} not found",
                        new.conversation_booking_id
                    ))
                })?;

        let message = MessageRepository::insert(&mut *tx, new).await?;
        let pointer = LastMessagePointer::at_message(&message);
        let conversation = &mut conversation_booking.conversation;
        let advanced =
            ConversationRepository::advance_last_message(&mut *tx, &conversation.id, &pointer)
                .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit message", e)
        })?;

        if advanced {
            conversation.last_message_id = Some(pointer.message_id);
            conversation.last_message_at = Some(pointer.at);
        } else {
            debug!(
                conversation_id = %conversation.id,
                message_id = %message.id,
                "Stored last-message pointer is newer, leaving it"
            );
        }

        let sender = match self.users.find_summary(&message.sender_id).await? {
            Some(sender) => sender,
            None => {
                warn!(sender_id = %message.sender_id, "Message sender has no user row");
                UserSummary::bare(message.sender_id.clone())
            }
        };
        let reads = self.messages.find_reads(&message.id).await?;

        debug!(
            message_id = %message.id,
            conversation_booking_id = %message.conversation_booking_id,
            "Message stored"
        );

        Ok(MessageDetail {
            message,
            sender,
            reads,
            conversation_booking,
        })
    }

    async fn find_unread_messages(&self, query: &UnreadQuery) -> AppResult<Vec<Message>> {
        self.messages.find_unread(query).await
    }

    async fn bulk_insert_reads(&self, rows: &[NewMessageRead]) -> AppResult<u64> {
        self.messages.bulk_insert_reads(rows).await
    }

    async fn create_notification(&self, new: &NewNotification) -> AppResult<Notification> {
        self.notifications.create(new).await
    }

    async fn expire_pending(&self, kind: ExpirableKind, now: DateTime<Utc>) -> AppResult<u64> {
        self.expiry.expire_pending(kind, now).await
    }

    async fn ping(&self) -> AppResult<()> {
        if self.db.health_check().await? {
            Ok(())
        } else {
            Err(AppError::database("Unexpected health check result"))
        }
    }
}
