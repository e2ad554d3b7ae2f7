//! The event router: turns inbound socket events into persistence calls
//! and room broadcasts.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_core::types::{ConversationBookingId, UserId};
use stayhub_service::{KeyedLocks, MessageService, ReadReceiptService};

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::manager::ConnectionManager;
use crate::message::types::{
    InboundEvent, MarkAsReadPayload, MessagesReadPayload, OutboundEvent, SendMessagePayload,
    TypingPayload,
};
use crate::message::validator::{validate_frame, validate_room_name};
use crate::metrics::RealtimeMetrics;
use crate::room::types::{ADMIN_ROOM, RoomKind};

/// Process-wide socket event hub.
#[derive(Debug)]
pub struct EventRouter {
    /// Connections and rooms.
    connections: Arc<ConnectionManager>,
    /// Message persistence.
    messages: MessageService,
    /// Read receipts.
    reads: ReadReceiptService,
    /// Holds persist-then-broadcast of `sendMessage` in order per
    /// conversation-booking.
    send_locks: KeyedLocks<ConversationBookingId>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
}

impl EventRouter {
    /// Creates a router over the given connections and services.
    pub fn new(
        connections: Arc<ConnectionManager>,
        messages: MessageService,
        reads: ReadReceiptService,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            connections,
            messages,
            reads,
            send_locks: KeyedLocks::new(),
            metrics,
        }
    }

    /// The connection manager behind this router.
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Handle one raw text frame from a connection.
    ///
    /// Any failure is reported to that connection alone as an `error` event.
    pub async fn handle_frame(&self, conn_id: ConnectionId, raw: &str) {
        let Some(handle) = self.connections.get(&conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };
        handle.touch().await;

        let event = match validate_frame(raw).and_then(|_| InboundEvent::parse(raw)) {
            Ok(event) => event,
            Err(e) => {
                self.reject(&handle, "frame", &e);
                return;
            }
        };

        let name = event.name();
        if let Err(e) = self.handle_event(&handle, event).await {
            self.reject(&handle, name, &e);
        }
    }

    /// Handle one decoded event from a connection.
    pub async fn handle_event(
        &self,
        handle: &ConnectionHandle,
        event: InboundEvent,
    ) -> AppResult<()> {
        self.metrics.event_received();
        match event {
            InboundEvent::JoinAdmin => self.connections.join(handle.id, ADMIN_ROOM),
            InboundEvent::JoinRoom(room) => self.join_room(handle, &room),
            InboundEvent::JoinConversation(id) => self.join_conversation(handle, &id),
            InboundEvent::SendMessage(payload) => self.send_message(handle, payload).await,
            InboundEvent::Typing(payload) => {
                self.relay_typing(handle, OutboundEvent::Typing(payload.clone()), &payload)
            }
            InboundEvent::StopTyping(payload) => {
                self.relay_typing(handle, OutboundEvent::StopTyping(payload.clone()), &payload)
            }
            InboundEvent::MarkAsRead(payload) => self.mark_as_read(handle, payload).await,
            InboundEvent::ReservationUpdate {
                conversation_booking_id,
                payload,
            } => {
                let room = conversation_room(&conversation_booking_id)?;
                self.connections
                    .broadcast(&[&room], &OutboundEvent::ReservationUpdate(payload), None);
                Ok(())
            }
        }
    }

    /// Emit an event into one room.
    pub fn emit(&self, room: &str, event: &OutboundEvent) -> usize {
        self.connections.broadcast(&[room], event, None)
    }

    /// Drop a connection from every room.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        self.connections.unregister(conn_id);
    }

    fn join_room(&self, handle: &ConnectionHandle, room: &str) -> AppResult<()> {
        validate_room_name(room)?;
        if let RoomKind::User(target) = RoomKind::parse(room) {
            authorize(handle, &target)?;
        }
        self.connections.join(handle.id, room)
    }

    fn join_conversation(
        &self,
        handle: &ConnectionHandle,
        id: &ConversationBookingId,
    ) -> AppResult<()> {
        let room = conversation_room(id)?;
        self.connections.join(handle.id, &room)
    }

    async fn send_message(
        &self,
        handle: &ConnectionHandle,
        payload: SendMessagePayload,
    ) -> AppResult<()> {
        authorize(handle, &payload.sender_id)?;
        let room = conversation_room(&payload.conversation_booking_id)?;

        let _guard = self.send_locks.lock(&payload.conversation_booking_id).await;

        let detail = self
            .messages
            .save_message(
                &payload.sender_id,
                &payload.text,
                &payload.conversation_booking_id,
            )
            .await?;

        let message_id = detail.message.id.clone();
        let delivered = self.connections.broadcast(
            &[ADMIN_ROOM, &room],
            &OutboundEvent::Message(Box::new(detail)),
            None,
        );

        debug!(
            conn_id = %handle.id,
            message_id = %message_id,
            room = %room,
            delivered,
            "Message broadcast"
        );
        Ok(())
    }

    fn relay_typing(
        &self,
        handle: &ConnectionHandle,
        event: OutboundEvent,
        payload: &TypingPayload,
    ) -> AppResult<()> {
        authorize(handle, &payload.sender_id)?;
        let room = conversation_room(&payload.conversation_booking_id)?;
        self.connections.broadcast(&[&room], &event, Some(handle.id));
        Ok(())
    }

    async fn mark_as_read(
        &self,
        handle: &ConnectionHandle,
        payload: MarkAsReadPayload,
    ) -> AppResult<()> {
        authorize(handle, &payload.user_id)?;
        let room = conversation_room(&payload.conversation_booking_id)?;

        let outcome = self
            .reads
            .mark_as_read(&payload.user_id, &payload.conversation_booking_id)
            .await?;
        if outcome.is_empty() {
            return Ok(());
        }

        self.connections.broadcast(
            &[&room],
            &OutboundEvent::MessagesRead(MessagesReadPayload {
                user_id: payload.user_id,
                message_ids: outcome.message_ids,
            }),
            None,
        );
        Ok(())
    }

    fn reject(&self, handle: &ConnectionHandle, event: &str, err: &AppError) {
        self.metrics.event_rejected();
        match err.kind {
            ErrorKind::Validation | ErrorKind::Authorization | ErrorKind::Conflict => {
                info!(conn_id = %handle.id, event, error = %err, "Event rejected");
            }
            _ => {
                error!(conn_id = %handle.id, event, error = %err, "Event failed");
            }
        }
        self.connections.send_to(&handle.id, &OutboundEvent::error(err));
    }
}

/// An identified session may only act as itself.
fn authorize(handle: &ConnectionHandle, claimed: &UserId) -> AppResult<()> {
    if claimed.is_blank() {
        return Err(AppError::validation("user id is required"));
    }
    match &handle.user_id {
        Some(own) if own != claimed => Err(AppError::authorization(format!(
            "Session for {own} cannot act as {claimed}"
        ))),
        _ => Ok(()),
    }
}

fn conversation_room(id: &ConversationBookingId) -> AppResult<String> {
    if id.is_blank() {
        return Err(AppError::validation("conversationBookingId is required"));
    }
    let room = RoomKind::Conversation(id.clone()).name();
    validate_room_name(&room)?;
    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use stayhub_core::config::RealtimeConfig;
    use stayhub_core::types::{BookingId, ConversationId};
    use stayhub_database::memory::{FailurePoint, MemoryGateway};
    use stayhub_entity::message::NewMessage;
    use stayhub_entity::user::UserSummary;
    use stayhub_database::PersistenceGateway;
    use tokio::sync::mpsc;

    use crate::connection::handle::OutboundFrame;

    struct Fixture {
        gateway: Arc<MemoryGateway>,
        router: EventRouter,
    }

    async fn fixture() -> Fixture {
        let gateway = Arc::new(MemoryGateway::new());
        for id in ["u1", "u2", "admin"] {
            gateway.insert_user(UserSummary::bare(UserId::new(id))).await;
        }
        gateway
            .insert_conversation(
                ConversationId::new("c1"),
                vec![UserId::new("u1"), UserId::new("u2")],
            )
            .await;
        for cb in ["42", "7"] {
            gateway
                .insert_conversation_booking(
                    ConversationBookingId::new(cb),
                    ConversationId::new("c1"),
                    BookingId::new(format!("b{cb}")),
                )
                .await
                .unwrap();
        }

        let metrics = Arc::new(RealtimeMetrics::new());
        let connections = Arc::new(ConnectionManager::new(
            RealtimeConfig::default(),
            metrics.clone(),
        ));
        let router = EventRouter::new(
            connections,
            MessageService::new(gateway.clone()),
            ReadReceiptService::new(gateway.clone()),
            metrics,
        );
        Fixture { gateway, router }
    }

    impl Fixture {
        fn connect(&self, user: Option<&str>) -> (ConnectionId, mpsc::Receiver<OutboundFrame>) {
            let (handle, rx) = self.router.connections().register(user.map(UserId::new));
            (handle.id, rx)
        }

        async fn send(&self, conn_id: ConnectionId, frame: Value) {
            self.router.handle_frame(conn_id, &frame.to_string()).await;
        }
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundFrame>) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let OutboundFrame::Text(text) = frame {
                events.push(serde_json::from_str(&text).unwrap());
            }
        }
        events
    }

    fn join_conversation(id: &str) -> Value {
        json!({"event": "joinConversation", "data": id})
    }

    fn send_message(sender: &str, text: &str, cb: Value) -> Value {
        json!({
            "event": "sendMessage",
            "data": {"senderId": sender, "text": text, "conversationBookingId": cb}
        })
    }

    #[tokio::test]
    async fn test_messages_reach_admin_and_conversation_in_order() {
        let f = fixture().await;
        let (admin, mut admin_rx) = f.connect(None);
        let (a, mut a_rx) = f.connect(Some("u1"));
        let (b, mut b_rx) = f.connect(Some("u2"));
        f.send(admin, json!({"event": "joinAdmin"})).await;
        f.send(a, join_conversation("42")).await;
        f.send(b, join_conversation("42")).await;

        f.send(a, send_message("u1", "hi", json!(42))).await;
        f.send(b, send_message("u2", "there", json!("42"))).await;

        for rx in [&mut a_rx, &mut b_rx, &mut admin_rx] {
            let texts: Vec<_> = drain(rx)
                .into_iter()
                .filter(|e| e["event"] == "message")
                .map(|e| e["data"]["text"].as_str().unwrap().to_string())
                .collect();
            assert_eq!(texts, vec!["hi", "there"]);
        }

        let conversation = f.gateway.conversation(&ConversationId::new("c1")).await.unwrap();
        let stored = f.gateway.messages_in(&ConversationBookingId::new("42")).await;
        assert_eq!(conversation.last_message_id.as_ref(), Some(&stored[1].id));
        assert_eq!(stored[1].text, "there");
    }

    #[tokio::test]
    async fn test_message_payload_is_hydrated() {
        let f = fixture().await;
        let (a, mut rx) = f.connect(Some("u1"));
        f.send(a, join_conversation("42")).await;
        f.send(a, send_message("u1", "hi", json!("42"))).await;

        let events = drain(&mut rx);
        let data = &events[0]["data"];
        assert_eq!(events[0]["event"], "message");
        assert_eq!(data["sender"]["id"], "u1");
        assert!(data["reads"].as_array().unwrap().is_empty());
        assert_eq!(data["conversationBooking"]["conversation"]["id"], "c1");
    }

    #[tokio::test]
    async fn test_failed_persistence_broadcasts_nothing() {
        let f = fixture().await;
        let (admin, mut admin_rx) = f.connect(None);
        let (a, mut a_rx) = f.connect(Some("u1"));
        let (b, mut b_rx) = f.connect(Some("u2"));
        f.send(admin, json!({"event": "joinAdmin"})).await;
        f.send(a, join_conversation("42")).await;
        f.send(b, join_conversation("42")).await;

        f.gateway.fail_on(FailurePoint::CreateMessage).await;
        f.send(a, send_message("u1", "lost", json!("42"))).await;

        assert!(drain(&mut admin_rx).is_empty());
        assert!(drain(&mut b_rx).is_empty());
        let own = drain(&mut a_rx);
        assert_eq!(own.len(), 1);
        assert_eq!(own[0]["event"], "error");
    }

    #[tokio::test]
    async fn test_failed_pointer_update_broadcasts_nothing() {
        let f = fixture().await;
        let (a, mut a_rx) = f.connect(Some("u1"));
        let (b, mut b_rx) = f.connect(Some("u2"));
        f.send(a, join_conversation("42")).await;
        f.send(b, join_conversation("42")).await;

        f.gateway.fail_on(FailurePoint::UpdateConversation).await;
        f.send(a, send_message("u1", "half", json!("42"))).await;

        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(drain(&mut a_rx)[0]["event"], "error");

        // The failed send left nothing behind for the peer to acknowledge.
        f.gateway.clear_failures().await;
        let mark = json!({"event": "markAsRead", "data": {"userId": "u2", "conversationBookingId": "42"}});
        f.send(b, mark).await;
        assert!(drain(&mut b_rx).is_empty());
        assert!(drain(&mut a_rx).is_empty());
        assert!(f.gateway.messages_in(&ConversationBookingId::new("42")).await.is_empty());
    }

    #[tokio::test]
    async fn test_typing_skips_sender() {
        let f = fixture().await;
        let (a, mut a_rx) = f.connect(Some("u1"));
        let (b, mut b_rx) = f.connect(Some("u2"));
        f.send(a, join_conversation("42")).await;
        f.send(b, join_conversation("42")).await;

        let typing = json!({"conversationBookingId": "42", "senderId": "u1"});
        f.send(a, json!({"event": "typing", "data": typing})).await;
        f.send(a, json!({"event": "stopTyping", "data": typing})).await;

        assert!(drain(&mut a_rx).is_empty());
        let events = drain(&mut b_rx);
        assert_eq!(events[0]["event"], "typing");
        assert_eq!(events[0]["data"]["senderId"], "u1");
        assert_eq!(events[1]["event"], "stopTyping");
    }

    #[tokio::test]
    async fn test_mark_as_read_broadcasts_once() {
        let f = fixture().await;
        for text in ["a", "b", "c"] {
            f.gateway
                .create_message_and_advance(&NewMessage {
                    sender_id: UserId::new("u1"),
                    text: text.to_string(),
                    conversation_booking_id: ConversationBookingId::new("7"),
                })
                .await
                .unwrap();
        }
        let (reader, mut rx) = f.connect(Some("u2"));
        f.send(reader, join_conversation("7")).await;

        let mark = json!({"event": "markAsRead", "data": {"userId": "u2", "conversationBookingId": 7}});
        f.send(reader, mark.clone()).await;
        f.send(reader, mark).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "messagesRead");
        assert_eq!(events[0]["data"]["userId"], "u2");
        assert_eq!(events[0]["data"]["messageIds"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reservation_update_reaches_sender_too() {
        let f = fixture().await;
        let (host, mut host_rx) = f.connect(Some("u1"));
        let (guest, mut guest_rx) = f.connect(Some("u2"));
        f.send(host, join_conversation("42")).await;
        f.send(guest, join_conversation("42")).await;

        let update = json!({"conversationBookingId": "42", "status": "ACCEPTED", "price": 120});
        f.send(host, json!({"event": "reservationUpdate", "data": update})).await;

        for rx in [&mut host_rx, &mut guest_rx] {
            let events = drain(rx);
            assert_eq!(events[0]["event"], "reservationUpdate");
            assert_eq!(events[0]["data"], update);
        }
    }

    #[tokio::test]
    async fn test_identity_mismatch_is_forbidden() {
        let f = fixture().await;
        let (a, mut a_rx) = f.connect(Some("u1"));
        f.send(a, join_conversation("42")).await;
        f.send(a, send_message("u2", "spoof", json!("42"))).await;
        f.send(a, json!({"event": "joinRoom", "data": "user-u2"})).await;

        let events = drain(&mut a_rx);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e["data"]["code"] == "FORBIDDEN"));
        assert!(f.gateway.messages_in(&ConversationBookingId::new("42")).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_frames_answered_with_error() {
        let f = fixture().await;
        let (a, mut rx) = f.connect(None);
        f.router.handle_frame(a, "not json").await;
        f.send(a, json!({"event": "joinRoom", "data": "bad room!"})).await;
        f.send(a, json!({"event": "sendMessage", "data": {"text": "no ids"}})).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e["event"] == "error"));
        assert!(events.iter().all(|e| e["data"]["code"] == "VALIDATION"));
    }

    #[tokio::test]
    async fn test_disconnect_leaves_rooms() {
        let f = fixture().await;
        let (a, _rx) = f.connect(Some("u1"));
        f.send(a, join_conversation("42")).await;
        assert!(f.router.connections().is_in_room(a, "conversation-42"));

        f.router.disconnect(&a);
        assert!(!f.router.connections().is_in_room(a, "conversation-42"));
        assert_eq!(f.router.emit("conversation-42", &OutboundEvent::ReservationUpdate(json!({}))), 0);
    }
}
