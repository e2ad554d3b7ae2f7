//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether scheduled jobs run in this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the expiry sweep.
    #[serde(default = "default_expiry_cron")]
    pub expiry_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expiry_cron: default_expiry_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expiry_cron() -> String {
    "0 * * * * *".to_string()
}
