//! User summary lookups.

use sqlx::PgPool;

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_core::types::UserId;
use stayhub_entity::user::UserSummary;

/// Read-only access to user profile summaries.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the summary for a user.
    pub async fn find_summary(&self, id: &UserId) -> AppResult<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, first_name, last_name, image FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}
