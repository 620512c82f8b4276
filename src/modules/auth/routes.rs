use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/logout", post(controller::logout))
        .route("/refresh", post(controller::refresh))
        .route("/me", get(controller::me))
        .route("/session", get(controller::session_status))
        .route("/users/{id}/status", patch(controller::update_user_status))
}
