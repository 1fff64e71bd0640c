use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::{AppError, AppResult},
    models::{
        auth::AuthenticatedUser,
        user::{LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    },
    routes::AppJson,
    services::auth::AuthService,
    validation::clean,
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let new_user = body.validate()?;
    let user = AuthService::register(&state.db, new_user).await?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (clean(body.username), body.password) else {
        return Err(AppError::validation("username and password are required."));
    };
    let response = AuthService::login(
        &state.db,
        &username,
        &password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await?;
    Ok(Json(response))
}

pub async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}
