use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        auth::AuthenticatedUser,
        certificate::Certificate,
        resident::{Resident, ResidentRequest},
    },
    routes::AppJson,
    services::{
        certificates::CertificateService,
        residents::{today, ResidentService},
    },
    AppState,
};

pub async fn list_residents(State(state): State<AppState>) -> AppResult<Json<Vec<Resident>>> {
    Ok(Json(ResidentService::list(&state.db).await?))
}

pub async fn get_resident(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Resident>> {
    Ok(Json(ResidentService::get(&state.db, id).await?))
}

pub async fn create_resident(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<ResidentRequest>,
) -> AppResult<(StatusCode, Json<Resident>)> {
    let input = body.validate(today())?;
    let resident = ResidentService::create(&state.db, &input).await?;
    state.audit.record(
        &user,
        format!("created a new resident: {}", resident.display_name()),
    );
    Ok((StatusCode::CREATED, Json(resident)))
}

pub async fn update_resident(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<ResidentRequest>,
) -> AppResult<Json<Resident>> {
    let input = body.validate(today())?;
    let resident = ResidentService::update(&state.db, id, &input).await?;
    state.audit.record(
        &user,
        format!("updated resident information: {}", resident.display_name()),
    );
    Ok(Json(resident))
}

pub async fn list_resident_certificates(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Certificate>>> {
    Ok(Json(CertificateService::for_resident(&state.db, id).await?))
}
