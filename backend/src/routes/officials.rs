use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{auth::AuthenticatedUser, official::Official, upload::UploadedFile},
    routes::message,
    services::{
        officials::OfficialService,
        uploads::{self, UploadKind},
    },
    AppState,
};

pub async fn list_officials(State(state): State<AppState>) -> AppResult<Json<Vec<Official>>> {
    Ok(Json(OfficialService::list(&state.db).await?))
}

pub async fn create_official(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Official>)> {
    let form = uploads::parse_official_form(multipart).await?;
    let (input, signature, picture) = form.validate()?;

    let signature_path = store(&state, UploadKind::Signature, signature).await?;
    let picture = store(&state, UploadKind::Picture, picture).await;
    let picture_path = keep_files_if(&state, picture, [signature_path.clone(), None]).await?;

    let created = OfficialService::create(
        &state.db,
        &input,
        signature_path.as_deref(),
        picture_path.as_deref(),
    )
    .await;
    let official = keep_files_if(&state, created, [signature_path, picture_path]).await?;
    state.audit.record(
        &user,
        format!(
            "added a new official: {} ({})",
            official.full_name, official.position
        ),
    );
    Ok((StatusCode::CREATED, Json(official)))
}

/// Files left out of the form keep the official's current paths.
pub async fn update_official(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<Official>> {
    let form = uploads::parse_official_form(multipart).await?;
    let (input, signature, picture) = form.validate()?;

    if !OfficialService::exists(&state.db, id).await? {
        return Err(AppError::not_found("Official not found."));
    }

    let signature_path = store(&state, UploadKind::Signature, signature).await?;
    let picture = store(&state, UploadKind::Picture, picture).await;
    let picture_path = keep_files_if(&state, picture, [signature_path.clone(), None]).await?;

    let updated = OfficialService::update(
        &state.db,
        id,
        &input,
        signature_path.as_deref(),
        picture_path.as_deref(),
    )
    .await;
    let official = keep_files_if(&state, updated, [signature_path, picture_path]).await?;
    state.audit.record(
        &user,
        format!(
            "updated official: {} ({})",
            official.full_name, official.position
        ),
    );
    Ok(Json(official))
}

pub async fn delete_official(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let official = OfficialService::delete(&state.db, id).await?;
    state.audit.record(
        &user,
        format!(
            "deleted official: {} ({})",
            official.full_name, official.position
        ),
    );
    Ok(message("Official deleted successfully"))
}

async fn store(
    state: &AppState,
    kind: UploadKind,
    file: Option<UploadedFile>,
) -> AppResult<Option<String>> {
    match file {
        Some(file) => Ok(Some(
            uploads::save(&state.config.uploads_dir, kind, &file).await?,
        )),
        None => Ok(None),
    }
}

/// Passes `result` through, deleting the just-stored files when it is an error.
async fn keep_files_if<T>(
    state: &AppState,
    result: AppResult<T>,
    stored: [Option<String>; 2],
) -> AppResult<T> {
    if result.is_err() {
        uploads::discard(&state.config.uploads_dir, &stored).await;
    }
    result
}
