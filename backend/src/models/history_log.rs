use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub user_role: Option<String>,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQuery {
    /// `(limit, offset)` with defaults applied and the page size capped.
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(100).clamp(1, 500);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateHistoryLogRequest {
    pub action: Option<String>,
}
