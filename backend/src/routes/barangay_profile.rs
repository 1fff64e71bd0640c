use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        auth::AuthenticatedUser,
        barangay_profile::{BarangayProfile, BarangayProfileRequest},
    },
    routes::AppJson,
    services::barangay_profile::BarangayProfileService,
    AppState,
};

/// `null` until the profile is first saved.
pub async fn get_profile(
    State(state): State<AppState>,
) -> AppResult<Json<Option<BarangayProfile>>> {
    Ok(Json(BarangayProfileService::get(&state.db).await?))
}

pub async fn put_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<BarangayProfileRequest>,
) -> AppResult<Json<BarangayProfile>> {
    let input = body.validate()?;
    let profile = BarangayProfileService::upsert(&state.db, &input).await?;
    state.audit.record(
        &user,
        format!(
            "updated barangay profile: {}, {}, {}",
            profile.barangay_name, profile.municipality, profile.province
        ),
    );
    Ok(Json(profile))
}
