use sqlx::PgPool;

use crate::{
    error::{is_undefined_table, AppError, AppResult},
    models::{auth::AuthenticatedUser, history_log::HistoryLog},
};

pub struct HistoryService;

impl HistoryService {
    /// Newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> AppResult<Vec<HistoryLog>> {
        sqlx::query_as::<_, HistoryLog>(
            "SELECT id, user_id, user_name, user_role, action, created_at
             FROM history_logs
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from(e).on_missing_history_table())
    }

    /// Stores `action` verbatim for the caller, without subject formatting.
    pub async fn append_raw(
        pool: &PgPool,
        user: &AuthenticatedUser,
        action: &str,
    ) -> AppResult<HistoryLog> {
        sqlx::query_as::<_, HistoryLog>(
            "INSERT INTO history_logs (user_id, user_name, user_role, action)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, user_name, user_role, action, created_at",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.role)
        .bind(action)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::from(e).on_missing_history_table())
    }

    /// `Ok(false)` when the audit table has not been migrated yet.
    pub async fn table_exists(pool: &PgPool) -> AppResult<bool> {
        match sqlx::query("SELECT 1 FROM history_logs LIMIT 1")
            .fetch_optional(pool)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_undefined_table(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
