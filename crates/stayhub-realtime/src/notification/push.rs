//! Mobile/browser push delivery.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stayhub_core::config::PushConfig;
use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;

/// A data-only push message addressed to one device token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Device registration token.
    pub token: String,
    /// Data fields delivered to the client app.
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    /// Data-only message carrying the notification display fields.
    pub fn notification(
        token: impl Into<String>,
        title: &str,
        body: &str,
        icon: &str,
        link: &str,
    ) -> Self {
        let data = [("title", title), ("body", body), ("icon", icon), ("link", link)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            token: token.into(),
            data,
        }
    }
}

/// Sends push messages to a device-messaging service.
#[async_trait]
pub trait PushSender: Send + Sync + std::fmt::Debug {
    /// Deliver one message, returning the provider's message name.
    async fn send(&self, message: PushMessage) -> AppResult<String>;
}

/// Push sender used when push delivery is disabled.
#[derive(Debug, Clone, Default)]
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn send(&self, message: PushMessage) -> AppResult<String> {
        debug!(fields = message.data.len(), "Push disabled, message discarded");
        Ok(String::new())
    }
}

#[derive(Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    data: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct FcmResponse {
    name: String,
}

/// Firebase Cloud Messaging HTTP v1 client.
#[derive(Debug, Clone)]
pub struct FcmPushSender {
    client: reqwest::Client,
    url: String,
    access_token: String,
}

impl FcmPushSender {
    /// Build a sender from configuration.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        if config.project_id.is_empty() {
            return Err(AppError::configuration(
                "push.project_id is required when push is enabled",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build push client", e)
            })?;
        Ok(Self {
            client,
            url: config.send_url(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, message: PushMessage) -> AppResult<String> {
        let body = FcmRequest {
            message: FcmMessage {
                token: &message.token,
                data: &message.data,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Push request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external(format!(
                "Push provider returned {status}: {detail}"
            )));
        }

        let parsed: FcmResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Invalid push response", e)
        })?;
        Ok(parsed.name)
    }
}

/// Build the configured push sender.
pub fn push_sender_from_config(
    config: &PushConfig,
) -> AppResult<std::sync::Arc<dyn PushSender>> {
    if config.enabled {
        Ok(std::sync::Arc::new(FcmPushSender::new(config)?))
    } else {
        Ok(std::sync::Arc::new(NoopPushSender))
    }
}
