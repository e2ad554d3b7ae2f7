//! Scheduled background jobs for StayHub.
//!
//! This crate provides:
//! - The expiry sweep that moves overdue booking requests, special offers
//!   and co-host invitations to `EXPIRED`
//! - A cron scheduler that runs it periodically

pub mod jobs;
pub mod scheduler;

pub use jobs::expiry::{ExpirySweep, KindOutcome, SweepReport};
pub use scheduler::CronScheduler;
