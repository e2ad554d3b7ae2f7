//! Push-messaging (FCM) configuration.

use serde::{Deserialize, Serialize};

/// Settings for the push-delivery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Whether push delivery is attempted at all.
    #[serde(default)]
    pub enabled: bool,
    /// Firebase project id.
    #[serde(default)]
    pub project_id: String,
    /// OAuth2 bearer token for the FCM HTTP v1 API.
    #[serde(default)]
    pub access_token: String,
    /// Base endpoint; the project path is appended.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl PushConfig {
    /// Full `messages:send` URL for the configured project.
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            access_token: String::new(),
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    10
}
