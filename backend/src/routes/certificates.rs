use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        auth::AuthenticatedUser,
        certificate::{Certificate, CertificateListItem, CertificateRequest},
    },
    routes::AppJson,
    services::certificates::CertificateService,
    AppState,
};

pub async fn list_certificates(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CertificateListItem>>> {
    Ok(Json(CertificateService::list(&state.db).await?))
}

pub async fn create_certificate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<CertificateRequest>,
) -> AppResult<(StatusCode, Json<Certificate>)> {
    let input = body.validate()?;
    let (certificate, resident) = CertificateService::create(&state.db, &input).await?;
    state.audit.record(
        &user,
        format!(
            "released a {} for {}",
            certificate.certificate_type,
            resident.display_name()
        ),
    );
    Ok((StatusCode::CREATED, Json(certificate)))
}
