//! In-memory persistence gateway.
//!
//! Mirrors the PostgreSQL constraints that matter to the real-time core
//! (foreign keys on sender and conversation-booking, one receipt per
//! message/user pair, a last-message pointer that never moves back) so
//! that local runs and tests observe the same behaviour as production.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use stayhub_core::error::AppError;
use stayhub_core::result::AppResult;
use stayhub_core::types::{
    BookingId, ConversationBookingId, ConversationId, MessageId, NotificationId, UserId,
};
use stayhub_entity::conversation::{Conversation, ConversationBooking, ConversationBookingDetail};
use stayhub_entity::expiry::ExpirableKind;
use stayhub_entity::message::{Message, MessageDetail, MessageRead, NewMessage};
use stayhub_entity::notification::{NewNotification, Notification};
use stayhub_entity::user::UserSummary;

use crate::gateway::{LastMessagePointer, NewMessageRead, PersistenceGateway, UnreadQuery};

/// Gateway operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// The message insert of `create_message_and_advance`.
    CreateMessage,
    /// The pointer update of `create_message_and_advance`.
    UpdateConversation,
    /// `create_notification`.
    CreateNotification,
    /// `expire_pending` for one kind.
    Expire(ExpirableKind),
}

/// A time-bound record tracked for the expiry sweep.
#[derive(Debug, Clone, PartialEq)]
struct ExpirableRecord {
    status: String,
    expired_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserSummary>,
    conversations: HashMap<ConversationId, Conversation>,
    bookings: HashMap<ConversationBookingId, ConversationBooking>,
    messages: Vec<Message>,
    reads: Vec<MessageRead>,
    read_keys: HashSet<(MessageId, UserId)>,
    notifications: Vec<Notification>,
    expirables: HashMap<(ExpirableKind, String), ExpirableRecord>,
    failures: HashSet<FailurePoint>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Wall-clock time, nudged forward so consecutive rows never share a
    /// timestamp.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(at);
        at
    }

    fn check(&self, point: FailurePoint) -> AppResult<()> {
        if self.failures.contains(&point) {
            return Err(AppError::database(format!("Injected failure at {point:?}")));
        }
        Ok(())
    }

    fn advance_pointer(
        &mut self,
        id: &ConversationId,
        pointer: &LastMessagePointer,
    ) -> AppResult<bool> {
        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Conversation {id} not found")))?;

        if !pointer.supersedes(conversation.last_message_at) {
            return Ok(false);
        }
        conversation.last_message_id = Some(pointer.message_id.clone());
        conversation.last_message_at = Some(pointer.at);
        Ok(true)
    }

    fn booking_detail(&self, id: &ConversationBookingId) -> AppResult<ConversationBookingDetail> {
        let booking = self
            .bookings
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Conversation booking {id} not found")))?;
        let conversation = self
            .conversations
            .get(&booking.conversation_id)
            .cloned()
            .ok_or_else(|| {
                AppError::database(format!(
                    "Conversation booking {id} references missing conversation {}",
                    booking.conversation_id
                ))
            })?;
        Ok(ConversationBookingDetail {
            booking,
            conversation,
        })
    }
}

/// Process-local gateway backed by hash maps behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RwLock<State>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user.
    pub async fn insert_user(&self, user: UserSummary) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Register a conversation between the given participants.
    pub async fn insert_conversation(
        &self,
        id: ConversationId,
        participant_ids: Vec<UserId>,
    ) -> Conversation {
        let mut state = self.state.write().await;
        let conversation = Conversation {
            id: id.clone(),
            participant_ids,
            last_message_id: None,
            last_message_at: None,
            created_at: state.next_timestamp(),
        };
        state.conversations.insert(id, conversation.clone());
        conversation
    }

    /// Bind a conversation to a booking.
    pub async fn insert_conversation_booking(
        &self,
        id: ConversationBookingId,
        conversation_id: ConversationId,
        booking_id: BookingId,
    ) -> AppResult<ConversationBooking> {
        let mut state = self.state.write().await;
        if !state.conversations.contains_key(&conversation_id) {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id} not found"
            )));
        }
        let booking = ConversationBooking {
            id: id.clone(),
            conversation_id,
            booking_id,
            created_at: state.next_timestamp(),
        };
        state.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    /// Track a time-bound record with the given status and deadline.
    pub async fn insert_expirable(
        &self,
        kind: ExpirableKind,
        id: impl Into<String>,
        status: impl Into<String>,
        expired_at: DateTime<Utc>,
    ) {
        self.state.write().await.expirables.insert(
            (kind, id.into()),
            ExpirableRecord {
                status: status.into(),
                expired_at,
            },
        );
    }

    /// Make an operation fail until [`clear_failures`](Self::clear_failures).
    pub async fn fail_on(&self, point: FailurePoint) {
        self.state.write().await.failures.insert(point);
    }

    /// Remove every injected failure.
    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    /// Current state of a conversation.
    pub async fn conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.state.read().await.conversations.get(id).cloned()
    }

    /// Messages of a conversation-booking in creation order.
    pub async fn messages_in(&self, id: &ConversationBookingId) -> Vec<Message> {
        self.state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| &m.conversation_booking_id == id)
            .cloned()
            .collect()
    }

    /// Receipts recorded for a message.
    pub async fn reads_for(&self, message_id: &MessageId) -> Vec<MessageRead> {
        self.state
            .read()
            .await
            .reads
            .iter()
            .filter(|r| &r.message_id == message_id)
            .cloned()
            .collect()
    }

    /// Notifications stored for a user, oldest first.
    pub async fn notifications_for(&self, user_id: &UserId) -> Vec<Notification> {
        self.state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Status of a tracked time-bound record.
    pub async fn expirable_status(&self, kind: ExpirableKind, id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .expirables
            .get(&(kind, id.to_string()))
            .map(|r| r.status.clone())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn create_message_and_advance(&self, new: &NewMessage) -> AppResult<MessageDetail> {
        let mut state = self.state.write().await;
        state.check(FailurePoint::CreateMessage)?;

        let mut conversation_booking = state.booking_detail(&new.conversation_booking_id)?;
        let sender = state
            .users
            .get(&new.sender_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User {} not found", new.sender_id)))?;

        let message = Message {
            id: MessageId::generate(),
            conversation_booking_id: new.conversation_booking_id.clone(),
            sender_id: new.sender_id.clone(),
            text: new.text.clone(),
            created_at: state.next_timestamp(),
        };

        // Nothing is written until both steps are known to succeed.
        state.check(FailurePoint::UpdateConversation)?;
        let conversation_id = conversation_booking.conversation.id.clone();
        state.advance_pointer(&conversation_id, &LastMessagePointer::at_message(&message))?;
        state.messages.push(message.clone());

        if let Some(conversation) = state.conversations.get(&conversation_id) {
            conversation_booking.conversation = conversation.clone();
        }

        Ok(MessageDetail {
            message,
            sender,
            reads: Vec::new(),
            conversation_booking,
        })
    }

    async fn find_unread_messages(&self, query: &UnreadQuery) -> AppResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut unread: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_booking_id == query.conversation_booking_id)
            .filter(|m| m.sender_id != query.exclude_sender_id)
            .filter(|m| {
                !state
                    .read_keys
                    .contains(&(m.id.clone(), query.user_id.clone()))
            })
            .cloned()
            .collect();
        unread.sort_by_key(|m| m.created_at);
        Ok(unread)
    }

    async fn bulk_insert_reads(&self, rows: &[NewMessageRead]) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut inserted = 0;
        for row in rows {
            let key = (row.message_id.clone(), row.user_id.clone());
            if state.read_keys.contains(&key) {
                continue;
            }
            if !state.messages.iter().any(|m| m.id == row.message_id) {
                return Err(AppError::not_found(format!(
                    "Message {} not found",
                    row.message_id
                )));
            }
            let read_at = state.next_timestamp();
            state.read_keys.insert(key);
            state.reads.push(MessageRead {
                message_id: row.message_id.clone(),
                user_id: row.user_id.clone(),
                read_at,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn create_notification(&self, new: &NewNotification) -> AppResult<Notification> {
        let mut state = self.state.write().await;
        state.check(FailurePoint::CreateNotification)?;

        let notification = Notification {
            id: NotificationId::generate(),
            user_id: new.user_id.clone(),
            title: new.title.clone(),
            body: new.body.clone(),
            icon: new.icon.clone(),
            link: new.link.clone(),
            kind: new.kind.clone(),
            created_at: state.next_timestamp(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn expire_pending(&self, kind: ExpirableKind, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        state.check(FailurePoint::Expire(kind))?;

        let mut count = 0;
        for ((record_kind, _), record) in state.expirables.iter_mut() {
            if *record_kind == kind
                && record.status == kind.pending_status()
                && record.expired_at < now
            {
                record.status = kind.expired_status().to_string();
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.insert_user(UserSummary::bare(UserId::new("u1"))).await;
        gateway.insert_user(UserSummary::bare(UserId::new("u2"))).await;
        gateway
            .insert_conversation(
                ConversationId::new("c1"),
                vec![UserId::new("u1"), UserId::new("u2")],
            )
            .await;
        gateway
            .insert_conversation_booking(
                ConversationBookingId::new("42"),
                ConversationId::new("c1"),
                BookingId::new("b1"),
            )
            .await
            .unwrap();
        gateway
    }

    fn new_message(sender: &str, text: &str) -> NewMessage {
        NewMessage {
            sender_id: UserId::new(sender),
            text: text.to_string(),
            conversation_booking_id: ConversationBookingId::new("42"),
        }
    }

    #[tokio::test]
    async fn test_create_message_resolves_relations() {
        let gateway = seeded().await;
        let detail = gateway.create_message_and_advance(&new_message("u1", "hi")).await.unwrap();
        assert_eq!(detail.sender.id, UserId::new("u1"));
        assert_eq!(detail.conversation_booking.conversation.id, ConversationId::new("c1"));
        assert!(detail.reads.is_empty());
    }

    #[tokio::test]
    async fn test_create_message_requires_known_sender_and_booking() {
        let gateway = seeded().await;
        let err = gateway.create_message_and_advance(&new_message("ghost", "hi")).await.unwrap_err();
        assert_eq!(err.kind, stayhub_core::error::ErrorKind::NotFound);

        let mut orphan = new_message("u1", "hi");
        orphan.conversation_booking_id = ConversationBookingId::new("999");
        assert!(gateway.create_message_and_advance(&orphan).await.is_err());
        assert!(gateway.messages_in(&ConversationBookingId::new("42")).await.is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let gateway = seeded().await;
        let a = gateway.create_message_and_advance(&new_message("u1", "a")).await.unwrap();
        let b = gateway.create_message_and_advance(&new_message("u1", "b")).await.unwrap();
        assert!(a.message.created_at < b.message.created_at);
    }

    #[tokio::test]
    async fn test_detail_carries_advanced_pointer() {
        let gateway = seeded().await;
        let detail = gateway
            .create_message_and_advance(&new_message("u1", "hi"))
            .await
            .unwrap();
        let conversation = &detail.conversation_booking.conversation;
        assert_eq!(conversation.last_message_id.as_ref(), Some(&detail.message.id));
        assert_eq!(conversation.last_message_at, Some(detail.message.created_at));
        assert_eq!(
            gateway.conversation(&ConversationId::new("c1")).await.as_ref(),
            Some(conversation)
        );
    }

    #[tokio::test]
    async fn test_pointer_failure_leaves_no_message() {
        let gateway = seeded().await;
        let before = gateway
            .create_message_and_advance(&new_message("u1", "kept"))
            .await
            .unwrap();
        gateway.fail_on(FailurePoint::UpdateConversation).await;

        assert!(gateway
            .create_message_and_advance(&new_message("u1", "dropped"))
            .await
            .is_err());

        let messages = gateway.messages_in(&ConversationBookingId::new("42")).await;
        assert_eq!(messages, vec![before.message.clone()]);
        let conversation = gateway.conversation(&ConversationId::new("c1")).await.unwrap();
        assert_eq!(conversation.last_message_id, Some(before.message.id));
    }

    #[tokio::test]
    async fn test_pointer_never_moves_back() {
        let gateway = seeded().await;
        let id = ConversationId::new("c1");
        let now = Utc::now();
        let newer = LastMessagePointer {
            message_id: MessageId::new("m2"),
            at: now,
        };
        let older = LastMessagePointer {
            message_id: MessageId::new("m1"),
            at: now - Duration::seconds(5),
        };

        let mut state = gateway.state.write().await;
        assert!(state.advance_pointer(&id, &newer).unwrap());
        assert!(!state.advance_pointer(&id, &older).unwrap());
        assert_eq!(
            state.conversations[&id].last_message_id,
            Some(MessageId::new("m2"))
        );

        let err = state
            .advance_pointer(&ConversationId::new("nope"), &newer)
            .unwrap_err();
        assert_eq!(err.kind, stayhub_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_bulk_insert_reads_skips_duplicates() {
        let gateway = seeded().await;
        let m = gateway.create_message_and_advance(&new_message("u1", "hi")).await.unwrap();
        let row = NewMessageRead {
            message_id: m.message.id.clone(),
            user_id: UserId::new("u2"),
        };
        assert_eq!(gateway.bulk_insert_reads(&[row.clone(), row.clone()]).await.unwrap(), 1);
        assert_eq!(gateway.bulk_insert_reads(&[row]).await.unwrap(), 0);
        assert_eq!(gateway.reads_for(&m.message.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unread_excludes_own_and_seen() {
        let gateway = seeded().await;
        gateway.create_message_and_advance(&new_message("u2", "mine")).await.unwrap();
        let theirs = gateway.create_message_and_advance(&new_message("u1", "theirs")).await.unwrap();
        let seen = gateway.create_message_and_advance(&new_message("u1", "seen")).await.unwrap();
        gateway
            .bulk_insert_reads(&[NewMessageRead {
                message_id: seen.message.id,
                user_id: UserId::new("u2"),
            }])
            .await
            .unwrap();

        let unread = gateway
            .find_unread_messages(&UnreadQuery::for_reader(
                UserId::new("u2"),
                ConversationBookingId::new("42"),
            ))
            .await
            .unwrap();
        let ids: Vec<_> = unread.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![theirs.message.id]);
    }

    #[tokio::test]
    async fn test_expire_pending_only_touches_overdue_pending_rows() {
        let gateway = MemoryGateway::new();
        let now = Utc::now();
        let kind = ExpirableKind::BookingRequest;
        gateway.insert_expirable(kind, "late", "ACCEPTED", now - Duration::days(1)).await;
        gateway.insert_expirable(kind, "future", "ACCEPTED", now + Duration::days(1)).await;
        gateway.insert_expirable(kind, "pending", "PENDING", now - Duration::days(1)).await;

        assert_eq!(gateway.expire_pending(kind, now).await.unwrap(), 1);
        assert_eq!(gateway.expirable_status(kind, "late").await.as_deref(), Some("EXPIRED"));
        assert_eq!(gateway.expirable_status(kind, "future").await.as_deref(), Some("ACCEPTED"));
        assert_eq!(gateway.expirable_status(kind, "pending").await.as_deref(), Some("PENDING"));
        assert_eq!(gateway.expire_pending(kind, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let gateway = seeded().await;
        gateway.fail_on(FailurePoint::CreateNotification).await;
        let row = NewNotification {
            user_id: UserId::new("u1"),
            title: "t".to_string(),
            body: String::new(),
            icon: String::new(),
            link: "/".to_string(),
            kind: "general".to_string(),
        };
        assert!(gateway.create_notification(&row).await.is_err());
        gateway.clear_failures().await;
        assert!(gateway.create_notification(&row).await.is_ok());
    }
}
