//! Durable user notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use stayhub_core::types::{NotificationId, UserId};

/// Title used when the caller supplies none.
pub const DEFAULT_TITLE: &str = "Notification";
/// Icon used when the caller supplies none.
pub const DEFAULT_ICON: &str = "/images/notification-icon.png";
/// Link used when the caller supplies none.
pub const DEFAULT_LINK: &str = "/";
/// Notification type used when the caller supplies none.
pub const DEFAULT_TYPE: &str = "general";

/// A stored one-way alert. Never mutated by the real-time core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon path.
    pub icon: String,
    /// Click-through link.
    pub link: String,
    /// Notification type (`general`, `booking`, `payout`, ...).
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    /// When the notification was stored.
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied notification content.
///
/// Known display fields are optional; anything else is carried through to
/// the socket payload untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Icon path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Click-through link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Additional fields forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationData {
    /// Content with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Title with the default applied.
    pub fn resolved_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Body with the default applied.
    pub fn resolved_body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Icon with the default applied.
    pub fn resolved_icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    /// Link with the default applied.
    pub fn resolved_link(&self) -> &str {
        self.link.as_deref().unwrap_or(DEFAULT_LINK)
    }
}

/// Data required to store a notification, defaults already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon path.
    pub icon: String,
    /// Click-through link.
    pub link: String,
    /// Notification type.
    pub kind: String,
}

impl NewNotification {
    /// Build the row to store from caller content, applying defaults.
    pub fn from_data(user_id: UserId, data: &NotificationData, kind: Option<&str>) -> Self {
        Self {
            user_id,
            title: data.resolved_title().to_string(),
            body: data.resolved_body().to_string(),
            icon: data.resolved_icon().to_string(),
            link: data.resolved_link().to_string(),
            kind: kind.unwrap_or(DEFAULT_TYPE).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let row = NewNotification::from_data(
            UserId::new("u1"),
            &NotificationData::titled("Payout Processed"),
            None,
        );
        assert_eq!(row.title, "Payout Processed");
        assert_eq!(row.body, "");
        assert_eq!(row.icon, DEFAULT_ICON);
        assert_eq!(row.link, "/");
        assert_eq!(row.kind, "general");
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let data: NotificationData =
            serde_json::from_str(r#"{"title":"Booking","bookingId":"b9"}"#).unwrap();
        assert_eq!(data.extra["bookingId"], "b9");
        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["bookingId"], "b9");
        assert!(back.get("body").is_none());
    }

    #[test]
    fn test_type_field_name() {
        let n = Notification {
            id: NotificationId::new("n1"),
            user_id: UserId::new("u1"),
            title: DEFAULT_TITLE.to_string(),
            body: String::new(),
            icon: DEFAULT_ICON.to_string(),
            link: DEFAULT_LINK.to_string(),
            kind: "booking".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "booking");
        assert_eq!(json["userId"], "u1");
    }
}
