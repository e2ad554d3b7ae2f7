//! Connection lifecycle: handles, pool, manager, heartbeat.

pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use handle::{ConnectionHandle, ConnectionId, OutboundFrame};
pub use manager::ConnectionManager;
