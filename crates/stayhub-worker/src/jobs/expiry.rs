//! Expiry sweep: bulk-transitions overdue time-bound records to `EXPIRED`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use stayhub_database::gateway::PersistenceGateway;
use stayhub_entity::expiry::ExpirableKind;

/// Result of sweeping one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum KindOutcome {
    /// Rows moved to `EXPIRED`.
    Expired {
        /// Row count.
        count: u64,
    },
    /// The update failed; other kinds still ran.
    Failed {
        /// Error description.
        error: String,
    },
}

/// Per-kind results of one sweep, in sweep order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Cut-off used for every kind.
    pub now: DateTime<Utc>,
    /// One entry per kind.
    pub outcomes: Vec<(ExpirableKind, KindOutcome)>,
}

impl SweepReport {
    /// Rows expired across all kinds.
    pub fn total_expired(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                KindOutcome::Expired { count } => *count,
                KindOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Number of kinds whose update failed.
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, KindOutcome::Failed { .. }))
            .count()
    }

    /// Outcome for one kind.
    pub fn outcome(&self, kind: ExpirableKind) -> Option<&KindOutcome> {
        self.outcomes.iter().find(|(k, _)| *k == kind).map(|(_, o)| o)
    }
}

/// Moves every pending record whose deadline has passed to `EXPIRED`.
#[derive(Debug)]
pub struct ExpirySweep {
    /// Persistence gateway.
    gateway: Arc<dyn PersistenceGateway>,
    /// Set while a scheduled run is in progress.
    running: AtomicBool,
}

impl ExpirySweep {
    /// Create a new sweep.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            running: AtomicBool::new(false),
        }
    }

    /// Sweep every kind with `now` as the cut-off.
    ///
    /// Each kind is updated on its own; a failure is logged and recorded in
    /// the report without stopping the remaining kinds.
    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepReport {
        let mut outcomes = Vec::with_capacity(ExpirableKind::ALL.len());

        for kind in ExpirableKind::ALL {
            let outcome = match self.gateway.expire_pending(kind, now).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(kind = %kind, count, "Expired overdue records");
                    }
                    KindOutcome::Expired { count }
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Expiry update failed");
                    KindOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push((kind, outcome));
        }

        SweepReport { now, outcomes }
    }

    /// Scheduled entry point. Skips if the previous run is still going.
    pub async fn run_scheduled(&self) -> Option<SweepReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Previous expiry sweep still running, skipping");
            return None;
        }

        let report = self.run_once(Utc::now()).await;
        self.running.store(false, Ordering::Release);

        tracing::debug!(
            expired = report.total_expired(),
            failures = report.failures(),
            "Expiry sweep finished"
        );
        Some(report)
    }
}
