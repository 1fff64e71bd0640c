// Library exports for the server binary, operator tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use config::Config;
use middleware::auth::JwtSecret;
use services::audit::AuditLog;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub audit: AuditLog,
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Residents
        .route("/residents", get(routes::residents::list_residents).post(routes::residents::create_resident))
        .route("/residents/{id}", get(routes::residents::get_resident).put(routes::residents::update_resident))
        .route("/residents/{id}/certificates", get(routes::residents::list_resident_certificates))
        // Households
        .route("/households", get(routes::households::list_households).post(routes::households::create_household))
        .route(
            "/households/{id}",
            get(routes::households::get_household)
                .put(routes::households::update_household)
                .delete(routes::households::delete_household),
        )
        .route("/households/{id}/members", get(routes::households::list_members).post(routes::households::add_member))
        .route("/households/{id}/members/{member_id}", delete(routes::households::remove_member))
        .route("/households-with-residents", post(routes::households::create_household_with_residents))
        // Incidents
        .route("/incidents", get(routes::incidents::list_incidents).post(routes::incidents::create_incident))
        .route("/incidents/{id}", put(routes::incidents::update_incident).delete(routes::incidents::delete_incident))
        // Social services
        .route("/services", get(routes::social_services::list_services).post(routes::social_services::create_service))
        .route("/services/{id}", put(routes::social_services::update_service).delete(routes::social_services::delete_service))
        .route(
            "/services/{id}/beneficiaries",
            get(routes::social_services::list_beneficiaries).post(routes::social_services::add_beneficiary),
        )
        .route("/services/{id}/beneficiaries/{beneficiary_id}", delete(routes::social_services::remove_beneficiary))
        // Certificates
        .route("/certificates", get(routes::certificates::list_certificates).post(routes::certificates::create_certificate))
        // Barangay profile
        .route("/barangay-profile", get(routes::barangay_profile::get_profile).put(routes::barangay_profile::put_profile))
        // Officials
        .route("/officials", get(routes::officials::list_officials).post(routes::officials::create_official))
        .route("/officials/{id}", put(routes::officials::update_official).delete(routes::officials::delete_official))
        // Audit trail
        .route("/history-logs", get(routes::history_logs::list_history).post(routes::history_logs::create_history))
        .route("/history-logs/test", get(routes::history_logs::check_history_table));

    Router::new()
        .route("/", get(routes::health::banner))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .layer(axum::Extension(JwtSecret(config.jwt_secret.clone())))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

/// An empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("ignoring invalid CORS origin {o:?}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(allow_origin)
}
