use axum::{routing::post, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn otp_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/request", post(controller::request_otp))
        .route("/verify", post(controller::verify_otp))
}
