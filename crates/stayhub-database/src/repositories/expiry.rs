//! Bulk expiry of time-bound records.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stayhub_core::error::{AppError, ErrorKind};
use stayhub_core::result::AppResult;
use stayhub_entity::expiry::ExpirableKind;

/// Runs the status transition for one expirable kind.
#[derive(Debug, Clone)]
pub struct ExpiryRepository {
    pool: PgPool,
}

impl ExpiryRepository {
    /// Create a new expiry repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `UPDATE <table> SET status = EXPIRED WHERE status = <pending> AND expired_at < now`.
    pub async fn expire_pending(&self, kind: ExpirableKind, now: DateTime<Utc>) -> AppResult<u64> {
        // Table names come from a closed enum, never from input.
        let sql = format!(
            "UPDATE {} SET status = $1 WHERE status = $2 AND expired_at < $3",
            kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(kind.expired_status())
            .bind(kind.pending_status())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to expire {kind} records"),
                    e,
                )
            })?;

        Ok(result.rows_affected())
    }
}
