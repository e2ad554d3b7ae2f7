//! Connection manager: connection lifecycle, room membership and fan-out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use stayhub_core::config::RealtimeConfig;
use stayhub_core::error::AppError;
use stayhub_core::types::UserId;

use crate::message::types::OutboundEvent;
use crate::metrics::RealtimeMetrics;
use crate::room::registry::RoomRegistry;
use crate::room::types::RoomKind;

use super::handle::{ConnectionHandle, ConnectionId, OutboundFrame, SendError};
use super::pool::ConnectionPool;

/// Manages all active socket connections and the rooms they are in.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Room registry.
    rooms: RoomRegistry,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig, metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            pool: ConnectionPool::new(),
            rooms: RoomRegistry::new(),
            metrics,
            config,
        }
    }

    /// Registers a new connection.
    ///
    /// Identified sessions join `user-{userId}` straight away. When the user
    /// already has the maximum number of sessions the oldest is closed.
    /// Returns the handle and the receiver the writer task drains.
    pub fn register(
        &self,
        user_id: Option<UserId>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(user_id.clone(), tx));

        if let Some(user_id) = &user_id {
            let existing = self.pool.user_connections(user_id);
            if existing.len() >= self.config.max_connections_per_user {
                warn!(
                    user_id = %user_id,
                    count = existing.len(),
                    max = self.config.max_connections_per_user,
                    "User at max connections, closing oldest"
                );
                if let Some(oldest) = existing.first() {
                    self.unregister(&oldest.id);
                }
            }
        }

        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        if let Some(user_id) = &user_id {
            self.rooms
                .join(&RoomKind::User(user_id.clone()).name(), handle.id);
        }

        info!(
            conn_id = %handle.id,
            user_id = user_id.as_ref().map(|u| u.as_str()).unwrap_or("-"),
            "Socket connection registered"
        );

        (handle, rx)
    }

    /// Removes a connection from the pool and every room.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.rooms.leave_all(*conn_id);
            self.metrics.connection_closed();

            info!(
                conn_id = %conn_id,
                lifetime_seconds = (Utc::now() - handle.connected_at).num_seconds(),
                "Socket connection unregistered"
            );
        }
    }

    /// Gets a live connection.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Adds a connection to a room, enforcing the per-connection room limit.
    pub fn join(&self, conn_id: ConnectionId, room: &str) -> Result<(), AppError> {
        if self.pool.get(&conn_id).is_none() {
            return Err(AppError::not_found(format!("Connection {conn_id} not found")));
        }

        if !self.rooms.is_member(room, conn_id)
            && self.rooms.room_count_of(conn_id) >= self.config.max_rooms_per_connection
        {
            return Err(AppError::conflict(format!(
                "Maximum rooms ({}) reached",
                self.config.max_rooms_per_connection
            )));
        }

        if self.rooms.join(room, conn_id) {
            debug!(conn_id = %conn_id, room = %room, "Joined room");
        }
        Ok(())
    }

    /// Whether a connection is in a room.
    pub fn is_in_room(&self, conn_id: ConnectionId, room: &str) -> bool {
        self.rooms.is_member(room, conn_id)
    }

    /// Sends an event to one connection.
    pub fn send_to(&self, conn_id: &ConnectionId, event: &OutboundEvent) -> bool {
        let Some(frame) = serialize(event) else {
            return false;
        };
        match self.pool.get(conn_id) {
            Some(handle) => self.deliver(&handle, frame) == 1,
            None => false,
        }
    }

    /// Broadcasts an event to every member of the given rooms, each member
    /// receiving it once, optionally skipping one connection.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(
        &self,
        rooms: &[&str],
        event: &OutboundEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let Some(frame) = serialize(event) else {
            return 0;
        };

        let mut sent = 0;
        for conn_id in self.rooms.members_of_any(rooms) {
            if Some(conn_id) == exclude {
                continue;
            }
            if let Some(handle) = self.pool.get(&conn_id) {
                sent += self.deliver(&handle, frame.clone());
            }
        }
        sent
    }

    /// Queue a transport ping on one connection.
    pub fn ping(&self, handle: &ConnectionHandle) -> bool {
        self.deliver(handle, OutboundFrame::Ping) == 1
    }

    fn deliver(&self, handle: &ConnectionHandle, frame: OutboundFrame) -> usize {
        match handle.send(frame) {
            Ok(()) => {
                self.metrics.frames_sent(1);
                1
            }
            Err(SendError::Full) => {
                warn!(conn_id = %handle.id, "Outbound buffer full, frame dropped");
                self.metrics.frame_dropped();
                0
            }
            Err(SendError::Closed) => {
                debug!(conn_id = %handle.id, "Connection closed, unregistering");
                self.unregister(&handle.id);
                0
            }
        }
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.unregister(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique identified users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Returns the heartbeat configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}

fn serialize(event: &OutboundEvent) -> Option<OutboundFrame> {
    match serde_json::to_string(event) {
        Ok(text) => Some(OutboundFrame::Text(text)),
        Err(e) => {
            error!(error = %e, "Failed to serialize outbound event");
            None
        }
    }
}
