// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::sink::NotificationService;

#[axum::debug_handler]
pub async fn get_user_notifications(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&state);

    let notifications = service
        .list_for_recipient(user_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!(notifications)))
}
