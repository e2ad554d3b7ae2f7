//! Named rooms that connections join to receive broadcasts.

pub mod registry;
pub mod room;
pub mod subscription;
pub mod types;

pub use registry::RoomRegistry;
pub use types::{ADMIN_ROOM, RoomKind};
