//! Reverse index from connections to the rooms they joined.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Tracks which rooms each connection is in.
#[derive(Debug)]
pub struct SubscriptionTracker {
    /// Connection ID → set of room names.
    conn_to_rooms: DashMap<ConnectionId, HashSet<String>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self {
            conn_to_rooms: DashMap::new(),
        }
    }

    /// Records a membership.
    pub fn add(&self, conn_id: ConnectionId, room: String) {
        self.conn_to_rooms.entry(conn_id).or_default().insert(room);
    }

    /// Whether the connection is in the room.
    pub fn contains(&self, conn_id: ConnectionId, room: &str) -> bool {
        self.conn_to_rooms
            .get(&conn_id)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Returns the number of rooms for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_rooms
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes every membership of a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.conn_to_rooms
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}

impl Default for SubscriptionTracker {
    fn default() -> Self {
        Self::new()
    }
}
