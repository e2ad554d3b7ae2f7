//! # stayhub-database
//!
//! The persistence gateway consumed by the real-time core, with a
//! PostgreSQL implementation built from per-entity repositories and an
//! in-memory implementation for local development and tests.

pub mod connection;
pub mod gateway;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;

pub use connection::DatabasePool;
pub use gateway::{LastMessagePointer, NewMessageRead, PersistenceGateway, UnreadQuery};
pub use memory::{FailurePoint, MemoryGateway};
pub use postgres::PgGateway;
