//! Room registry: rooms are created on first join and dropped when empty.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::room::Room;
use super::subscription::SubscriptionTracker;

/// Registry of all live rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Room name → Room.
    rooms: DashMap<String, Room>,
    /// Reverse index.
    subscriptions: SubscriptionTracker,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Adds a connection to a room. Returns `false` if it was already in it.
    pub fn join(&self, room_name: &str, conn_id: ConnectionId) -> bool {
        let added = self
            .rooms
            .entry(room_name.to_string())
            .or_insert_with(|| Room::new(room_name.to_string()))
            .join(conn_id);
        self.subscriptions.add(conn_id, room_name.to_string());
        added
    }

    /// Removes a connection from every room it is in.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        let rooms = self.subscriptions.remove_all(conn_id);
        for room_name in &rooms {
            if let Some(mut room) = self.rooms.get_mut(room_name) {
                room.leave(conn_id);
                if room.is_empty() {
                    drop(room);
                    self.rooms.remove_if(room_name, |_, r| r.is_empty());
                }
            }
        }
    }

    /// Members of one room.
    pub fn members(&self, room_name: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room_name)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Members of any of the rooms, each listed once.
    pub fn members_of_any(&self, room_names: &[&str]) -> Vec<ConnectionId> {
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for name in room_names {
            for conn_id in self.members(name) {
                if seen.insert(conn_id) {
                    members.push(conn_id);
                }
            }
        }
        members
    }

    /// Whether a connection is in a room.
    pub fn is_member(&self, room_name: &str, conn_id: ConnectionId) -> bool {
        self.subscriptions.contains(conn_id, room_name)
    }

    /// Number of rooms a connection is in.
    pub fn room_count_of(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
