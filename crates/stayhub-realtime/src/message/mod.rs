//! Wire protocol: event envelopes and validation.

pub mod types;
pub mod validator;

pub use types::{InboundEvent, OutboundEvent};
