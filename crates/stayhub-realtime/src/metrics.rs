//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Connections ever opened.
    connections_opened: AtomicU64,
    /// Connections closed.
    connections_closed: AtomicU64,
    /// Inbound events accepted for processing.
    events_received: AtomicU64,
    /// Inbound frames or events rejected with an `error` reply.
    events_rejected: AtomicU64,
    /// Frames queued to connections.
    frames_sent: AtomicU64,
    /// Frames dropped because a connection buffer was full.
    frames_dropped: AtomicU64,
    /// Notifications handed to the dispatcher.
    notifications_dispatched: AtomicU64,
}

impl RealtimeMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound event.
    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected frame or event.
    pub fn event_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record queued frames.
    pub fn frames_sent(&self, count: u64) {
        self.frames_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a dropped frame.
    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dispatched notification.
    pub fn notification_dispatched(&self) {
        self.notifications_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_active: opened.saturating_sub(closed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            notifications_dispatched: self.notifications_dispatched.load(Ordering::Relaxed),
            rooms_active: 0,
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Connections ever opened.
    pub connections_opened: u64,
    /// Currently open connections.
    pub connections_active: u64,
    /// Inbound events processed.
    pub events_received: u64,
    /// Inbound frames or events rejected.
    pub events_rejected: u64,
    /// Frames queued to connections.
    pub frames_sent: u64,
    /// Frames dropped on full buffers.
    pub frames_dropped: u64,
    /// Notifications dispatched.
    pub notifications_dispatched: u64,
    /// Live rooms; filled in by the engine.
    pub rooms_active: u64,
}
