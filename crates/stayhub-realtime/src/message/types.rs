//! Inbound and outbound event definitions.
//!
//! Every frame in either direction is a JSON object
//! `{"event": "<name>", "data": <payload>}`. Event names and payload
//! shapes are a client contract and must not change without a version bump.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use stayhub_core::error::AppError;
use stayhub_core::types::{ConversationBookingId, MessageId, UserId};
use stayhub_entity::message::MessageDetail;

/// Raw frame shape shared by both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

/// `sendMessage` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Author.
    pub sender_id: UserId,
    /// Body, stored as sent.
    #[serde(default)]
    pub text: String,
    /// Target conversation-booking.
    pub conversation_booking_id: ConversationBookingId,
}

/// `typing` / `stopTyping` payload, relayed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Conversation-booking being typed in.
    pub conversation_booking_id: ConversationBookingId,
    /// Typist.
    pub sender_id: UserId,
}

/// `markAsRead` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadPayload {
    /// Reader.
    pub user_id: UserId,
    /// Conversation-booking being read.
    pub conversation_booking_id: ConversationBookingId,
}

/// `messagesRead` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadPayload {
    /// Reader.
    pub user_id: UserId,
    /// Messages newly marked as read.
    pub message_ids: Vec<MessageId>,
}

/// `error` payload, sent only to the originating session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Machine-readable code.
    pub code: String,
    /// Description.
    pub message: String,
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.kind.code().to_string(),
            message: err.message.clone(),
        }
    }
}

/// Events sent by clients.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Join `admin_room`.
    JoinAdmin,
    /// Join an arbitrary named room.
    JoinRoom(String),
    /// Join `conversation-{id}`.
    JoinConversation(ConversationBookingId),
    /// Persist and broadcast a chat message.
    SendMessage(SendMessagePayload),
    /// Typing indicator on.
    Typing(TypingPayload),
    /// Typing indicator off.
    StopTyping(TypingPayload),
    /// Record read receipts.
    MarkAsRead(MarkAsReadPayload),
    /// Relay a booking-state change.
    ReservationUpdate {
        /// Target conversation-booking, taken from the payload.
        conversation_booking_id: ConversationBookingId,
        /// Full payload, relayed verbatim.
        payload: Value,
    },
}

impl InboundEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinAdmin => "joinAdmin",
            Self::JoinRoom(_) => "joinRoom",
            Self::JoinConversation(_) => "joinConversation",
            Self::SendMessage(_) => "sendMessage",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stopTyping",
            Self::MarkAsRead(_) => "markAsRead",
            Self::ReservationUpdate { .. } => "reservationUpdate",
        }
    }

    /// Parse a text frame.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("Malformed frame: {e}")))?;
        Self::from_envelope(envelope)
    }

    /// Decode the payload for the named event.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, AppError> {
        let Envelope { event, data } = envelope;
        let event = match event.as_str() {
            "joinAdmin" => Self::JoinAdmin,
            "joinRoom" => Self::JoinRoom(payload(&event, data)?),
            "joinConversation" => Self::JoinConversation(payload(&event, data)?),
            "sendMessage" => Self::SendMessage(payload(&event, data)?),
            "typing" => Self::Typing(payload(&event, data)?),
            "stopTyping" => Self::StopTyping(payload(&event, data)?),
            "markAsRead" => Self::MarkAsRead(payload(&event, data)?),
            "reservationUpdate" => {
                let id = data
                    .get("conversationBookingId")
                    .cloned()
                    .ok_or_else(|| {
                        AppError::validation("reservationUpdate requires conversationBookingId")
                    })?;
                Self::ReservationUpdate {
                    conversation_booking_id: payload(&event, id)?,
                    payload: data,
                }
            }
            other => {
                return Err(AppError::validation(format!("Unknown event: {other}")));
            }
        };
        Ok(event)
    }
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, AppError> {
    serde_json::from_value(data)
        .map_err(|e| AppError::validation(format!("Invalid {event} payload: {e}")))
}

/// Events sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// A persisted chat message.
    Message(Box<MessageDetail>),
    /// Someone started typing.
    Typing(TypingPayload),
    /// Someone stopped typing.
    StopTyping(TypingPayload),
    /// Messages were read.
    MessagesRead(MessagesReadPayload),
    /// A relayed booking-state change.
    ReservationUpdate(Value),
    /// A personal notification.
    Notification(Map<String, Value>),
    /// A rejected inbound frame.
    Error(ErrorPayload),
}

impl OutboundEvent {
    /// Error reply for a failed inbound frame.
    pub fn error(err: &AppError) -> Self {
        Self::Error(ErrorPayload::from(err))
    }
}
