// libs/appointment-cell/src/services/blackout.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::models::NotificationType;
use notification_cell::services::sink::{NotificationSink, PostgrestNotificationSink};
use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, DisableDayRequest, DisabledDay,
    DisabledHour, HourRequest,
};
use crate::services::booking::parse_appointment;

pub struct BlackoutService {
    store: Arc<PostgrestClient>,
    sink: Arc<dyn NotificationSink>,
}

impl BlackoutService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(PostgrestClient::new(config));
        let sink = Arc::new(PostgrestNotificationSink::with_store(Arc::clone(&store)));
        Self { store, sink }
    }

    pub fn with_sink(config: &AppConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store: Arc::new(PostgrestClient::new(config)),
            sink,
        }
    }

    /// Disable a whole day: register the blackout, cancel every active
    /// appointment on that date, then notify each affected patient once.
    /// Appointments cancelled before a mid-way failure stay cancelled; the
    /// error is surfaced so the practitioner can retry.
    pub async fn disable_day(&self, request: DisableDayRequest) -> Result<DisabledDay, AppointmentError> {
        info!("Disabling day {}", request.date);

        let disabled = self.register_disabled_day(&request).await?;
        let cancelled = self
            .cancel_active_appointments(request.date, request.admin_note.as_deref())
            .await?;
        self.notify_affected_patients(&cancelled, request.admin_note.as_deref())
            .await?;

        info!(
            "Day {} disabled, {} appointments cancelled",
            request.date,
            cancelled.len()
        );
        Ok(disabled)
    }

    /// Remove a day blackout. Previously cancelled appointments are not
    /// resurrected; freed slots simply become bookable again.
    pub async fn enable_day(&self, date: NaiveDate) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/disabled_days?date=eq.{}", date);
        self.store
            .execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!("Day {} enabled", date);
        Ok(())
    }

    pub async fn disable_hour(&self, request: HourRequest) -> Result<DisabledHour, AppointmentError> {
        let body = json!({
            "date": request.date,
            "time": request.time.format("%H:%M:%S").to_string(),
        });

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/disabled_hours?on_conflict=date,time",
                Some(body),
                Some(ignore_duplicates_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!("Hour {} on {} disabled", request.time, request.date);

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled hour: {}", e))),
            // Already registered; the blackout stands.
            None => Ok(DisabledHour {
                date: request.date,
                time: request.time,
            }),
        }
    }

    pub async fn enable_hour(&self, request: HourRequest) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/disabled_hours?date=eq.{}&time=eq.{}",
            request.date,
            request.time.format("%H:%M:%S"),
        );
        self.store
            .execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!("Hour {} on {} enabled", request.time, request.date);
        Ok(())
    }

    pub async fn list_disabled_days(&self) -> Result<Vec<DisabledDay>, AppointmentError> {
        let result: Vec<Value> = self
            .store
            .request(Method::GET, "/rest/v1/disabled_days?order=date.asc", None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DisabledDay>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled days: {}", e)))
    }

    pub async fn list_disabled_hours(&self, date: NaiveDate) -> Result<Vec<DisabledHour>, AppointmentError> {
        let path = format!("/rest/v1/disabled_hours?date=eq.{}&order=time.asc", date);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DisabledHour>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled hours: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn register_disabled_day(&self, request: &DisableDayRequest) -> Result<DisabledDay, AppointmentError> {
        let body = json!({
            "date": request.date,
            "admin_note": request.admin_note,
        });

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/disabled_days?on_conflict=date",
                Some(body),
                Some(ignore_duplicates_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled day: {}", e))),
            // Already registered; the blackout stands.
            None => Ok(DisabledDay {
                date: request.date,
                admin_note: request.admin_note.clone(),
            }),
        }
    }

    async fn cancel_active_appointments(
        &self,
        date: NaiveDate,
        admin_note: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?date=eq.{}&status=in.(pending,confirmed)",
            date
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let active: Vec<Appointment> = result
            .into_iter()
            .map(parse_appointment)
            .collect::<Result<Vec<Appointment>, _>>()?;

        let mut cancelled = Vec::with_capacity(active.len());
        for appointment in active {
            // No rollback: appointments already moved to cancelled stay
            // cancelled when a later one fails.
            match self.cancel_one(&appointment, admin_note).await {
                Ok(updated) => cancelled.push(updated),
                Err(e) => {
                    warn!(
                        "Day-disable cancellation stopped at appointment {} after {} cancellations: {}",
                        appointment.id,
                        cancelled.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(cancelled)
    }

    async fn cancel_one(
        &self,
        appointment: &Appointment,
        admin_note: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(AppointmentStatus::Cancelled.to_string()));
        if let Some(note) = admin_note {
            update_data.insert("admin_note".to_string(), json!(note));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .store
            .request_with_headers(Method::PATCH, &path, Some(Value::Object(update_data)), Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => parse_appointment(row),
            None => Err(AppointmentError::DatabaseError("Failed to cancel appointment".to_string())),
        }
    }

    /// One day-disabled notification per affected patient. The active-per-day
    /// invariant already gives one appointment per patient; the dedup guards
    /// against dirty data.
    async fn notify_affected_patients(
        &self,
        cancelled: &[Appointment],
        admin_note: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let note = admin_note.map(str::trim).filter(|note| !note.is_empty());
        let mut notified: HashSet<Uuid> = HashSet::new();

        for appointment in cancelled {
            if !notified.insert(appointment.patient_id) {
                continue;
            }

            let mut message = format!(
                "Your appointment for {} at {} was cancelled because the day was disabled.",
                appointment.date,
                appointment.time.format("%H:%M"),
            );
            if let Some(note) = note {
                message.push_str(&format!(" Practitioner note: {}", note));
            }

            self.sink
                .notify(appointment.patient_id, NotificationType::DayDisabled, &message)
                .await
                .map_err(|e| AppointmentError::NotificationError(e.to_string()))?;
        }

        Ok(())
    }
}

fn ignore_duplicates_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Prefer",
        HeaderValue::from_static("resolution=ignore-duplicates,return=representation"),
    );
    headers
}
