//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod logging;
pub mod push;
pub mod realtime;
pub mod server;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::database::{DatabaseConfig, DatabaseProvider};
pub use self::logging::LoggingConfig;
pub use self::push::PushConfig;
pub use self::realtime::RealtimeConfig;
pub use self::server::ServerConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides (`STAYHUB__DATABASE__URL`).
const ENV_PREFIX: &str = "STAYHUB";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + env vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Real-time socket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Push delivery settings.
    #[serde(default)]
    pub push: PushConfig,
    /// Scheduled job settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and environment
    /// variables prefixed with `STAYHUB`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml_str("[database]\nprovider = \"memory\"\n").unwrap();
        assert_eq!(config.database.provider, DatabaseProvider::Memory);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.worker.expiry_cron, "0 * * * * *");
        assert!(!config.push.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_push_send_url() {
        let config = AppConfig::from_toml_str(
            "[push]\nenabled = true\nproject_id = \"stays\"\nendpoint = \"http://localhost:9000/\"\n",
        )
        .unwrap();
        assert_eq!(
            config.push.send_url(),
            "http://localhost:9000/v1/projects/stays/messages:send"
        );
    }

    #[test]
    fn test_invalid_provider_is_configuration_error() {
        let err = AppConfig::from_toml_str("[database]\nprovider = \"mongo\"\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
