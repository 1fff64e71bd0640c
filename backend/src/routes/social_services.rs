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
        service::{AddBeneficiaryRequest, Beneficiary, Service, ServiceRequest},
    },
    routes::{message, AppJson},
    services::social_services::SocialServiceService,
    AppState,
};

pub async fn list_services(State(state): State<AppState>) -> AppResult<Json<Vec<Service>>> {
    Ok(Json(SocialServiceService::list(&state.db).await?))
}

pub async fn create_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<ServiceRequest>,
) -> AppResult<(StatusCode, Json<Service>)> {
    let input = body.validate()?;
    let service = SocialServiceService::create(&state.db, &input).await?;
    state
        .audit
        .record(&user, format!("created a new service: {}", service.service_name));
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<ServiceRequest>,
) -> AppResult<Json<Service>> {
    let input = body.validate()?;
    let service = SocialServiceService::update(&state.db, id, &input).await?;
    state
        .audit
        .record(&user, format!("updated service: {}", service.service_name));
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let service = SocialServiceService::delete(&state.db, id).await?;
    state
        .audit
        .record(&user, format!("deleted service: {}", service.service_name));
    Ok(message("Service deleted successfully"))
}

pub async fn list_beneficiaries(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Beneficiary>>> {
    Ok(Json(SocialServiceService::list_beneficiaries(&state.db, id).await?))
}

pub async fn add_beneficiary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<AddBeneficiaryRequest>,
) -> AppResult<(StatusCode, Json<Beneficiary>)> {
    let (resident_id, notes) = body.validate()?;
    let beneficiary =
        SocialServiceService::add_beneficiary(&state.db, id, resident_id, notes).await?;
    state.audit.record(
        &user,
        format!(
            "added {} {} as beneficiary to service",
            beneficiary.first_name, beneficiary.last_name
        ),
    );
    Ok((StatusCode::CREATED, Json(beneficiary)))
}

pub async fn remove_beneficiary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, beneficiary_id)): Path<(i64, i64)>,
) -> AppResult<Json<Value>> {
    let beneficiary =
        SocialServiceService::remove_beneficiary(&state.db, id, beneficiary_id).await?;
    state.audit.record(
        &user,
        format!(
            "removed {} {} as beneficiary from service",
            beneficiary.first_name, beneficiary.last_name
        ),
    );
    Ok(message("Beneficiary removed successfully"))
}
