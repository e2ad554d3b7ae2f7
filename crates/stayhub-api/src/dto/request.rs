//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use stayhub_core::types::UserId;
use stayhub_entity::notification::NotificationData;

/// `POST /send-notification` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SendNotificationRequest {
    /// Device push token; push is skipped without one.
    #[serde(rename = "fcmToken", default)]
    pub fcm_token: Option<String>,
    /// Recipient.
    #[serde(rename = "userId", default)]
    pub user_id: Option<UserId>,
    /// Title.
    #[validate(length(max = 200, message = "title is too long"))]
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    #[validate(length(max = 4000, message = "body is too long"))]
    #[serde(default)]
    pub body: Option<String>,
    /// Click-through link.
    #[serde(default)]
    pub click_action: Option<String>,
    /// Icon path.
    #[serde(default)]
    pub icon: Option<String>,
    /// Notification type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl SendNotificationRequest {
    /// Content handed to the dispatcher; `click_action` becomes the link.
    pub fn notification_data(&self) -> NotificationData {
        NotificationData {
            title: self.title.clone(),
            body: self.body.clone(),
            icon: self.icon.clone(),
            link: self.click_action.clone(),
            extra: Map::<String, Value>::new(),
        }
    }
}

/// Query string on the socket upgrade.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketQuery {
    /// Identity attached by the upstream auth layer.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl SocketQuery {
    /// The identity, ignoring blank values.
    pub fn identity(self) -> Option<UserId> {
        self.user_id.filter(|id| !id.is_blank())
    }
}
