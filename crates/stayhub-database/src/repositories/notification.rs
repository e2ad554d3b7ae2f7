//! Notification repository.

use sqlx::PgPool;

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_core::types::NotificationId;
use stayhub_entity::notification::{NewNotification, Notification};

/// Repository for stored notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a notification.
    pub async fn create(&self, new: &NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, title, body, icon, link, type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(NotificationId::generate())
        .bind(&new.user_id)
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.icon)
        .bind(&new.link)
        .bind(&new.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })
    }
}
