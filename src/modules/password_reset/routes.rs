use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn password_reset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/forgot", post(controller::forgot_password))
        .route("/reset", post(controller::reset_password))
        .route("/reset/{token}", get(controller::reset_token_info))
}
