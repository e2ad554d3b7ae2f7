//! # stayhub-api
//!
//! HTTP boundary for StayHub built on Axum.
//!
//! Provides the socket upgrade, the `POST /send-notification` adapter, the
//! health endpoint, CORS, error mapping and the server bootstrap.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
