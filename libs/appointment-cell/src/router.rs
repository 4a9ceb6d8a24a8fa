// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", get(handlers::list_day_appointments))
        .route("/all", get(handlers::list_all_appointments))
        .route("/slots", get(handlers::get_day_schedule))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", put(handlers::update_appointment_status))
        .with_state(state)
}

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/disabled-days", get(handlers::list_disabled_days))
        .route("/disabled-days", post(handlers::disable_day))
        .route("/disabled-days/{date}", delete(handlers::enable_day))
        .route("/disabled-hours", get(handlers::list_disabled_hours))
        .route("/disabled-hours", post(handlers::disable_hour))
        .route("/disabled-hours", delete(handlers::enable_hour))
        .with_state(state)
}
