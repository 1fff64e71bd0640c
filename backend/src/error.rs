use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Postgres SQLSTATE codes the repository reacts to.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNDEFINED_TABLE: &str = "42P01";

/// Migration that creates the audit table. Named in operator-facing errors.
pub const HISTORY_LOGS_MIGRATION: &str = "migrations/20250102000000_history_logs.sql";

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing field, bad enum value, length ceiling.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate rows (membership, username race).
    #[error("{0}")]
    Conflict(String),

    /// Conflict-class refusals the API reports as 400.
    #[error("{0}")]
    Rejected(String),

    #[error("{message}")]
    MissingTable {
        message: String,
        migration_file: &'static str,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Rejected(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MissingTable { .. } | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Maps a unique violation to `Conflict(msg)`, leaving other errors untouched.
    pub fn on_unique_violation(self, msg: &str) -> Self {
        if self.is_sqlstate(UNIQUE_VIOLATION) {
            return AppError::Conflict(msg.to_string());
        }
        self
    }

    /// Maps a foreign-key violation to `NotFound(msg)`.
    pub fn on_foreign_key_violation(self, msg: &str) -> Self {
        if self.is_sqlstate(FOREIGN_KEY_VIOLATION) {
            return AppError::NotFound(msg.to_string());
        }
        self
    }

    /// Turns an undefined-table failure on `history_logs` into an operator hint.
    pub fn on_missing_history_table(self) -> Self {
        if self.is_sqlstate(UNDEFINED_TABLE) {
            return AppError::MissingTable {
                message: "History logs table does not exist. Please run the database migration."
                    .into(),
                migration_file: HISTORY_LOGS_MIGRATION,
            };
        }
        self
    }

    /// Data exceptions (class 22) and integrity violations (class 23): the row itself
    /// was rejected, as opposed to the connection or the server failing.
    pub fn is_rejected_row(&self) -> bool {
        matches!(
            self,
            AppError::Database(sqlx::Error::Database(db))
                if db.code().is_some_and(|c| c.starts_with("22") || c.starts_with("23"))
        )
    }

    fn is_sqlstate(&self, code: &str) -> bool {
        matches!(self, AppError::Database(e) if has_sqlstate(e, code))
    }
}

fn has_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(code))
}

/// True when the failure means a table has not been created yet.
pub fn is_undefined_table(err: &sqlx::Error) -> bool {
    has_sqlstate(err, UNDEFINED_TABLE)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::MissingTable {
                message,
                migration_file,
            } => {
                tracing::error!("{message} (migration: {migration_file})");
                json!({
                    "message": message,
                    "error": "Table not found",
                    "migrationFile": migration_file,
                })
            }
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                json!({ "message": "Unexpected server error" })
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                json!({ "message": "Unexpected server error" })
            }
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Rejected("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_database_errors_pass_through_mappers() {
        let err = AppError::validation("bad").on_unique_violation("dup");
        assert!(matches!(err, AppError::Validation(m) if m == "bad"));
    }
}
