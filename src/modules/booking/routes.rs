use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn booking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/availability", get(controller::get_availability))
        .route("/", post(controller::create_booking))
        .route("/me", get(controller::my_bookings))
        .route("/{id}/cancel", post(controller::cancel_booking))
}
