use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        auth::AuthenticatedUser,
        incident::{Incident, IncidentListItem, IncidentRequest},
    },
    routes::{message, AppJson},
    services::incidents::IncidentService,
    AppState,
};

pub async fn list_incidents(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<IncidentListItem>>> {
    Ok(Json(IncidentService::list(&state.db).await?))
}

pub async fn create_incident(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<IncidentRequest>,
) -> AppResult<(StatusCode, Json<Incident>)> {
    let input = body.validate()?;
    let incident = IncidentService::create(&state.db, &input).await?;
    state.audit.record(
        &user,
        format!(
            "recorded a new {} incident involving {}",
            incident.incident_type,
            input.involving()
        ),
    );
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn update_incident(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<IncidentRequest>,
) -> AppResult<Json<Incident>> {
    let input = body.validate()?;
    let incident = IncidentService::update(&state.db, id, &input).await?;
    state.audit.record(
        &user,
        format!("updated incident #{} - Status: {}", incident.id, incident.status),
    );
    Ok(Json(incident))
}

pub async fn delete_incident(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let incident = IncidentService::delete(&state.db, id).await?;
    state.audit.record(
        &user,
        format!("deleted {} incident #{}", incident.incident_type, incident.id),
    );
    Ok(message("Incident deleted successfully"))
}
