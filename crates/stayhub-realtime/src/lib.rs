//! # stayhub-realtime
//!
//! Real-time socket engine for StayHub. Provides:
//!
//! - Connection management with per-user caps and heartbeats
//! - Rooms: `admin_room`, `user-{userId}`, `conversation-{id}` and named rooms
//! - The event router for chat, typing, read receipts and reservation relays
//! - Notification dispatch through storage, push and the socket
//! - A set-once slot holding the process-wide router

pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod room;
pub mod router;
pub mod server;
pub mod slot;

pub use connection::manager::ConnectionManager;
pub use notification::dispatcher::{NotificationDispatcher, UserNotification};
pub use notification::push::{PushSender, push_sender_from_config};
pub use router::EventRouter;
pub use server::RealtimeEngine;
pub use slot::RouterSlot;
