pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{Config, DbPool};
use modules::auth::auth_routes;
use modules::booking::booking_routes;
use modules::otp::otp_routes;
use modules::password_reset::password_reset_routes;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

pub async fn create_app(db: DbPool, config: Config) -> Router {
    let state = Arc::new(AppState { db, config });

    // Blunt process-wide limiter; the per-email OTP cooldown is enforced in
    // the otp module against issuance timestamps.
    let rate_limiter = create_rate_limiter(100);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/auth/otp", otp_routes())
        .nest("/auth/password", password_reset_routes())
        .nest("/bookings", booking_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Courtbook API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
