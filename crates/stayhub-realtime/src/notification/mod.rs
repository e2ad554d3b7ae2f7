//! User notification delivery: store, push, socket.

pub mod dispatcher;
pub mod push;

pub use dispatcher::{NotificationDispatcher, UserNotification};
pub use push::{FcmPushSender, NoopPushSender, PushMessage, PushSender};
