//! Single room with member tracking.

use std::collections::HashSet;

use crate::connection::handle::ConnectionId;

/// A broadcast room and the connections currently in it.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room name.
    pub name: String,
    /// Member connection IDs.
    pub members: HashSet<ConnectionId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    /// Adds a member. Returns `false` if it was already present.
    pub fn join(&mut self, conn_id: ConnectionId) -> bool {
        self.members.insert(conn_id)
    }

    /// Removes a member.
    pub fn leave(&mut self, conn_id: ConnectionId) {
        self.members.remove(&conn_id);
    }

    /// Returns whether the room has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
