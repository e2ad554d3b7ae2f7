//! Notification adapter.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use stayhub_core::error::AppError;
use stayhub_realtime::UserNotification;

use crate::dto::request::SendNotificationRequest;
use crate::dto::response::{ApiResponse, SendNotificationResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /send-notification
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<ApiResponse<SendNotificationResponse>>, ApiError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let user_id = request
        .user_id
        .clone()
        .filter(|id| !id.is_blank())
        .ok_or_else(|| AppError::validation("userId is required"))?;

    let stored = state
        .realtime
        .notifications
        .send_user_notification(UserNotification {
            user_id,
            fcm_token: request.fcm_token.clone(),
            notification_data: request.notification_data(),
            kind: request.kind.clone(),
        })
        .await?;

    Ok(Json(ApiResponse::ok(SendNotificationResponse {
        stored: stored.is_some(),
        notification: stored,
    })))
}
