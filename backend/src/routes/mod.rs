use axum::{extract::FromRequest, Json};
use serde_json::{json, Value};

use crate::error::AppError;

pub mod auth;
pub mod barangay_profile;
pub mod certificates;
pub mod health;
pub mod history_logs;
pub mod households;
pub mod incidents;
pub mod officials;
pub mod residents;
pub mod social_services;

/// `Json` whose rejections render as `{"message": ...}` like every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `{"message": ...}` body for operations that have nothing else to return.
pub fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}
