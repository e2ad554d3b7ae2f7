//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use stayhub_core::config::RealtimeConfig;
use stayhub_core::error::AppError;
use stayhub_core::types::UserId;
use stayhub_database::gateway::PersistenceGateway;
use stayhub_service::{MessageService, ReadReceiptService};

use crate::connection::handle::{ConnectionId, OutboundFrame};
use crate::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use crate::connection::manager::ConnectionManager;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::notification::dispatcher::NotificationDispatcher;
use crate::notification::push::PushSender;
use crate::router::EventRouter;
use crate::slot::RouterSlot;

/// Central real-time engine that coordinates all socket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Event router.
    pub router: Arc<EventRouter>,
    /// Notification dispatcher.
    pub notifications: Arc<NotificationDispatcher>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Heartbeat timing.
    heartbeat: HeartbeatConfig,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and installs its router into `slot`.
    pub fn new(
        config: RealtimeConfig,
        gateway: Arc<dyn PersistenceGateway>,
        push: Arc<dyn PushSender>,
        slot: RouterSlot,
    ) -> Result<Self, AppError> {
        let heartbeat = HeartbeatConfig::from_config(&config);

        let metrics = Arc::new(RealtimeMetrics::new());
        let connections = Arc::new(ConnectionManager::new(config, metrics.clone()));
        let router = Arc::new(EventRouter::new(
            connections.clone(),
            MessageService::new(gateway.clone()),
            ReadReceiptService::new(gateway.clone()),
            metrics.clone(),
        ));
        slot.install(router.clone())?;

        let notifications = Arc::new(NotificationDispatcher::new(
            gateway,
            push,
            slot,
            metrics.clone(),
        ));

        info!("Real-time engine initialized");

        Ok(Self {
            connections,
            router,
            notifications,
            metrics,
            heartbeat,
        })
    }

    /// Open a session and start its heartbeat.
    pub fn connect(&self, user_id: Option<UserId>) -> (ConnectionId, mpsc::Receiver<OutboundFrame>) {
        let (handle, rx) = self.connections.register(user_id);
        tokio::spawn(run_heartbeat(
            Arc::downgrade(&handle),
            self.connections.clone(),
            self.heartbeat,
        ));
        (handle.id, rx)
    }

    /// Current counters plus live room count.
    pub fn stats(&self) -> MetricsSnapshot {
        let mut snapshot = self.metrics.snapshot();
        snapshot.rooms_active = self.connections.room_count() as u64;
        snapshot
    }

    /// Closes every session; their writer tasks then send a close frame.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down real-time engine");

        self.connections.close_all();

        info!("Real-time engine shut down");
        Ok(())
    }
}
