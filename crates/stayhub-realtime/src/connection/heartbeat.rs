//! Transport ping and idle detection.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, Instant};

use stayhub_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use super::manager::ConnectionManager;

/// Heartbeat timing.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Grace period after a missed ping before the connection is closed.
    pub ping_timeout: Duration,
}

impl HeartbeatConfig {
    /// Build from realtime configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds),
        }
    }

    /// Longest a connection may stay silent.
    pub fn max_idle(&self) -> Duration {
        self.ping_interval + self.ping_timeout
    }
}

/// Run the heartbeat loop for one connection.
///
/// Pings every `ping_interval` and unregisters the connection once it has
/// been silent for longer than `ping_interval + ping_timeout`. Only a weak
/// reference is held so that a connection removed elsewhere is released
/// promptly; the loop ends on the next tick.
pub async fn run_heartbeat(
    handle: Weak<ConnectionHandle>,
    manager: Arc<ConnectionManager>,
    config: HeartbeatConfig,
) {
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        interval.tick().await;

        let Some(handle) = handle.upgrade() else {
            break;
        };
        if !handle.is_alive() {
            break;
        }

        let silent = Utc::now() - handle.last_activity().await;
        if let Ok(silent) = silent.to_std() {
            if silent > config.max_idle() {
                tracing::warn!(
                    conn_id = %handle.id,
                    silent_seconds = silent.as_secs(),
                    "Heartbeat timeout, closing connection"
                );
                manager.unregister(&handle.id);
                break;
            }
        }

        if !manager.ping(&handle) && !handle.is_alive() {
            break;
        }
    }

    tracing::debug!("Heartbeat loop ended");
}
