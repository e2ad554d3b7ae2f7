//! Chat message use cases.

pub mod read;
pub mod service;

pub use read::{ReadOutcome, ReadReceiptService};
pub use service::MessageService;
