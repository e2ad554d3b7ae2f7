//! Individual socket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use stayhub_core::types::UserId;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Serialized event envelope.
    Text(String),
    /// Transport-level keepalive ping.
    Ping,
}

/// Why a frame could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The connection's buffer is full; the frame was dropped.
    Full,
    /// The connection is gone.
    Closed,
}

/// A handle to a single socket session.
///
/// Holds the sender half of the connection's outbound queue plus the
/// trusted identity (if any) the upstream auth layer attached.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Trusted user identity, when the session carries one.
    pub user_id: Option<UserId>,
    /// Sender for outbound frames.
    sender: mpsc::Sender<OutboundFrame>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last inbound activity (frames or pongs).
    last_activity: RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(user_id: Option<UserId>, sender: mpsc::Sender<OutboundFrame>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            sender,
            connected_at: now,
            last_activity: RwLock::new(now),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue a frame without waiting.
    pub fn send(&self, frame: OutboundFrame) -> Result<(), SendError> {
        if !self.is_alive() {
            return Err(SendError::Closed);
        }
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                Err(SendError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(SendError::Closed)
            }
        }
    }

    /// Check if connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record inbound activity.
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Time of the last inbound activity.
    pub async fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().await
    }
}
