//! Notification dispatcher: store, push, then socket, each step isolated.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use stayhub_core::error::AppError;
use stayhub_core::result::AppResult;
use stayhub_core::types::UserId;
use stayhub_database::gateway::PersistenceGateway;
use stayhub_entity::notification::{NewNotification, Notification, NotificationData};

use crate::message::types::OutboundEvent;
use crate::metrics::RealtimeMetrics;
use crate::room::types::RoomKind;
use crate::slot::RouterSlot;

use super::push::{PushMessage, PushSender};

/// One logical notification for one user.
#[derive(Debug, Clone, Default)]
pub struct UserNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Device token for push delivery.
    pub fcm_token: Option<String>,
    /// Caller-supplied content.
    pub notification_data: NotificationData,
    /// Notification type; `general` when absent.
    pub kind: Option<String>,
}

/// Delivers notifications through storage, push and the socket router.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    /// Persistence gateway.
    gateway: Arc<dyn PersistenceGateway>,
    /// Push transport.
    push: Arc<dyn PushSender>,
    /// Router lookup.
    router: RouterSlot,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
}

impl NotificationDispatcher {
    /// Create a new dispatcher.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        push: Arc<dyn PushSender>,
        router: RouterSlot,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            gateway,
            push,
            router,
            metrics,
        }
    }

    /// Store the notification, push it when a token is given, and emit it
    /// into `user-{userId}`.
    ///
    /// A failure in one step never prevents the next. The only error is a
    /// missing user id. Returns the stored notification, or `None` when the
    /// store step failed.
    pub async fn send_user_notification(
        &self,
        request: UserNotification,
    ) -> AppResult<Option<Notification>> {
        if request.user_id.is_blank() {
            return Err(AppError::validation("userId is required"));
        }
        self.metrics.notification_dispatched();

        let row = NewNotification::from_data(
            request.user_id.clone(),
            &request.notification_data,
            request.kind.as_deref(),
        );

        let stored = match self.gateway.create_notification(&row).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                error!(user_id = %request.user_id, error = %e, "Failed to store notification");
                None
            }
        };

        if let Some(token) = request.fcm_token.as_deref().filter(|t| !t.is_empty()) {
            let message =
                PushMessage::notification(token, &row.title, &row.body, &row.icon, &row.link);
            match self.push.send(message).await {
                Ok(name) => debug!(user_id = %request.user_id, name = %name, "Push sent"),
                Err(e) => warn!(user_id = %request.user_id, error = %e, "Push delivery failed"),
            }
        }

        match self.router.get() {
            Some(router) => {
                let payload = socket_payload(stored.as_ref(), &request.notification_data);
                let room = RoomKind::User(request.user_id.clone()).name();
                let delivered = router.emit(&room, &OutboundEvent::Notification(payload));
                debug!(user_id = %request.user_id, delivered, "Notification emitted");
            }
            None => {
                warn!(
                    user_id = %request.user_id,
                    "Event router not initialised, skipping socket delivery"
                );
            }
        }

        Ok(stored)
    }
}

/// `{id?} ∪ notification_data`.
fn socket_payload(stored: Option<&Notification>, data: &NotificationData) -> Map<String, Value> {
    let mut payload = match serde_json::to_value(data) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(notification) = stored {
        payload.insert(
            "id".to_string(),
            Value::String(notification.id.as_str().to_string()),
        );
    }
    payload
}
