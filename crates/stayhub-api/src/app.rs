//! Application builder: wires the gateway, socket engine, scheduled jobs
//! and HTTP routes into a running server.

use std::sync::Arc;

use axum::Router;

use stayhub_core::config::AppConfig;
use stayhub_core::error::AppError;
use stayhub_database::gateway::{PersistenceGateway, connect_gateway};
use stayhub_realtime::notification::push::{PushSender, push_sender_from_config};
use stayhub_realtime::server::RealtimeEngine;
use stayhub_realtime::slot::RouterSlot;
use stayhub_worker::{CronScheduler, ExpirySweep};

use crate::router::build_router;
use crate::state::AppState;

/// Creates the socket engine over `gateway` and installs its router into
/// `slot`.
pub fn build_state(
    config: AppConfig,
    gateway: Arc<dyn PersistenceGateway>,
    push: Arc<dyn PushSender>,
    slot: RouterSlot,
) -> Result<AppState, AppError> {
    let realtime = RealtimeEngine::new(config.realtime.clone(), gateway.clone(), push, slot)?;

    Ok(AppState {
        config: Arc::new(config),
        gateway,
        realtime: Arc::new(realtime),
    })
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the StayHub server until `shutdown` resolves.
pub async fn run_server<F>(config: AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        provider = ?config.database.provider,
        "Connecting persistence gateway..."
    );
    let gateway = connect_gateway(&config.database).await?;
    let push = push_sender_from_config(&config.push)?;

    let state = build_state(config.clone(), gateway.clone(), push, RouterSlot::global().clone())?;

    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_expiry_sweep(&config.worker.expiry_cron, Arc::new(ExpirySweep::new(gateway)))
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduled jobs disabled");
        None
    };

    let realtime = state.realtime.clone();
    let app = build_app(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("StayHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    realtime.shutdown().await?;
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    tracing::info!("StayHub server stopped");
    Ok(())
}
