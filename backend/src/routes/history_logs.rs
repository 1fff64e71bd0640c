use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, HISTORY_LOGS_MIGRATION},
    models::{
        auth::AuthenticatedUser,
        history_log::{CreateHistoryLogRequest, HistoryLog, HistoryQuery},
    },
    routes::AppJson,
    services::history::HistoryService,
    validation::clean,
    AppState,
};

pub async fn list_history(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryLog>>> {
    let (limit, offset) = query.page();
    Ok(Json(HistoryService::list(&state.db, limit, offset).await?))
}

pub async fn create_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<CreateHistoryLogRequest>,
) -> AppResult<(StatusCode, Json<HistoryLog>)> {
    let action = clean(body.action).ok_or_else(|| AppError::validation("action is required."))?;
    let log = HistoryService::append_raw(&state.db, &user, &action).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn check_history_table(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Value>)> {
    if HistoryService::table_exists(&state.db).await? {
        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "History logs endpoint is accessible",
                "tableExists": true,
                "status": "OK",
            })),
        ))
    } else {
        tracing::error!("history_logs table is missing; run {HISTORY_LOGS_MIGRATION}");
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "History logs table does not exist",
                "tableExists": false,
                "error": format!("Please run {HISTORY_LOGS_MIGRATION}"),
                "migrationFile": HISTORY_LOGS_MIGRATION,
            })),
        ))
    }
}
