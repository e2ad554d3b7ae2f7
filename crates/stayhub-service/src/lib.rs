//! # stayhub-service
//!
//! Business logic service layer for StayHub. Services orchestrate the
//! persistence gateway to implement the chat use cases the real-time
//! router needs: saving a message together with the conversation's
//! last-message pointer, and recording read receipts.
//!
//! Services follow constructor injection; the gateway is provided at
//! construction time as an `Arc<dyn PersistenceGateway>`.

pub mod locks;
pub mod message;

pub use locks::KeyedLocks;
pub use message::{MessageService, ReadOutcome, ReadReceiptService};
