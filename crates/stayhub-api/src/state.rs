//! Application state shared across all handlers.

use std::sync::Arc;

use stayhub_core::config::AppConfig;
use stayhub_database::gateway::PersistenceGateway;
use stayhub_realtime::server::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Persistence gateway
    pub gateway: Arc<dyn PersistenceGateway>,
    /// Socket engine: connections, event router, notification dispatcher
    pub realtime: Arc<RealtimeEngine>,
}
