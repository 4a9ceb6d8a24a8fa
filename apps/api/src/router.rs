use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use appointment_cell::router::{appointment_routes, schedule_routes};
use notification_cell::router::notification_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Practice booking API is running!" }))
        .route(
            "/health",
            get(|| async { Json(json!({ "ok": true, "message": "Practice booking API" })) }),
        )
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
}
