// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, BookAppointmentRequest, DisableDayRequest, HourRequest, UpdateStatusRequest,
};
use crate::services::blackout::BlackoutService;
use crate::services::booking::BookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service.book(request).await.map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment status updated"
    })))
}

#[axum::debug_handler]
pub async fn list_day_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .list_for_day(query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service.list_all().await.map_err(map_appointment_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .list_for_patient(patient_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let schedule = booking_service
        .day_schedule(query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(schedule)))
}

// ==============================================================================
// BLACKOUT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_disabled_days(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    let days = blackout_service
        .list_disabled_days()
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(days)))
}

#[axum::debug_handler]
pub async fn disable_day(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<DisableDayRequest>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    let disabled = blackout_service
        .disable_day(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(disabled)))
}

#[axum::debug_handler]
pub async fn enable_day(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    blackout_service.enable_day(date).await.map_err(map_appointment_error)?;

    Ok(Json(json!({ "ok": true })))
}

#[axum::debug_handler]
pub async fn list_disabled_hours(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    let hours = blackout_service
        .list_disabled_hours(query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(hours)))
}

#[axum::debug_handler]
pub async fn disable_hour(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<HourRequest>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    let disabled = blackout_service
        .disable_hour(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(disabled)))
}

#[axum::debug_handler]
pub async fn enable_hour(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<HourRequest>,
) -> Result<Json<Value>, AppError> {
    let blackout_service = BlackoutService::new(&state);

    blackout_service.enable_hour(request).await.map_err(map_appointment_error)?;

    Ok(Json(json!({ "ok": true })))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PastDate
        | AppointmentError::DayDisabled
        | AppointmentError::HourDisabled => AppError::BadRequest(e.to_string()),
        AppointmentError::SlotTaken
        | AppointmentError::DuplicatePatientBooking
        | AppointmentError::InvalidStatusTransition(_) => AppError::Conflict(e.to_string()),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        AppointmentError::NotificationError(msg) => AppError::Internal(msg),
    }
}
