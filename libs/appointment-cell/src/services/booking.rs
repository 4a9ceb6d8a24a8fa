// libs/appointment-cell/src/services/booking.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::models::NotificationType;
use notification_cell::services::sink::{NotificationSink, PostgrestNotificationSink};
use shared_config::AppConfig;
use shared_database::postgrest::{PostgrestClient, StorageError};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    CancellationSource, DaySchedule, DisabledDay, DisabledHour, SlotStatus,
    UpdateStatusRequest,
};
use crate::services::availability;
use crate::services::lifecycle::LifecycleService;
use crate::services::slots::SlotCalendar;

pub struct BookingService {
    store: Arc<PostgrestClient>,
    lifecycle: LifecycleService,
    calendar: SlotCalendar,
    sink: Arc<dyn NotificationSink>,
    practitioner_id: Uuid,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(PostgrestClient::new(config));
        let sink = Arc::new(PostgrestNotificationSink::with_store(Arc::clone(&store)));
        Self::assemble(config, store, sink)
    }

    /// Swap the notification sink, for tests and future outbox setups.
    pub fn with_sink(config: &AppConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let store = Arc::new(PostgrestClient::new(config));
        Self::assemble(config, store, sink)
    }

    fn assemble(config: &AppConfig, store: Arc<PostgrestClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            lifecycle: LifecycleService::new(),
            calendar: SlotCalendar::from_config(config),
            sink,
            practitioner_id: config.practitioner_id,
        }
    }

    /// Book a slot for a patient. Validation order: patient-per-day guard,
    /// then slot availability, then the insert; no write happens when any
    /// validation fails.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} on {} at {}",
            request.patient_id, request.date, request.time
        );

        let today = Local::now().date_naive();
        let appointments = self.active_appointments_for_day(request.date).await?;

        availability::check_patient_day(request.patient_id, request.date, &appointments)?;

        let disabled_days = self.disabled_day_set(request.date).await?;
        let disabled_hours = self.disabled_hour_set(request.date).await?;

        availability::check_slot(
            request.date,
            request.time,
            today,
            &appointments,
            &disabled_days,
            &disabled_hours,
        )?;

        let appointment = self.insert_appointment(&request).await?;

        info!("Appointment {} booked for patient {}", appointment.id, appointment.patient_id);
        Ok(appointment)
    }

    /// Apply a status transition and emit its notification. The transition
    /// table is validated before anything is written.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment {} to status {}", appointment_id, request.status);

        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle.validate_transition(&current.status, &request.status)?;

        let updated = self.apply_status(&current, &request).await?;
        self.emit_transition_notification(&updated, &request).await?;

        info!("Appointment {} moved to {}", updated.id, updated.status);
        Ok(updated)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => parse_appointment(row),
            None => Err(AppointmentError::NotFound),
        }
    }

    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?date=eq.{}&order=time.asc", date);
        self.fetch_appointments(&path).await
    }

    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=date.asc,time.asc",
            patient_id
        );
        self.fetch_appointments(&path).await
    }

    pub async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_appointments("/rest/v1/appointments?order=date.asc,time.asc").await
    }

    /// Every working-hour slot of a date with its bookable flag.
    pub async fn day_schedule(&self, date: NaiveDate) -> Result<DaySchedule, AppointmentError> {
        let today = Local::now().date_naive();
        let appointments = self.active_appointments_for_day(date).await?;
        let disabled_days = self.disabled_day_set(date).await?;
        let disabled_hours = self.disabled_hour_set(date).await?;

        let slots = self
            .calendar
            .slots()
            .into_iter()
            .map(|time| SlotStatus {
                time,
                bookable: availability::is_bookable(
                    date,
                    time,
                    today,
                    &appointments,
                    &disabled_days,
                    &disabled_hours,
                ),
            })
            .collect();

        Ok(DaySchedule { date, slots })
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn fetch_appointments(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .store
            .request(Method::GET, path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().map(parse_appointment).collect()
    }

    async fn active_appointments_for_day(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?date=eq.{}&status=in.(pending,confirmed)",
            date
        );
        self.fetch_appointments(&path).await
    }

    async fn disabled_day_set(&self, date: NaiveDate) -> Result<HashSet<NaiveDate>, AppointmentError> {
        let path = format!("/rest/v1/disabled_days?date=eq.{}", date);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let days: Vec<DisabledDay> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DisabledDay>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled days: {}", e)))?;

        Ok(days.into_iter().map(|day| day.date).collect())
    }

    async fn disabled_hour_set(
        &self,
        date: NaiveDate,
    ) -> Result<HashSet<(NaiveDate, NaiveTime)>, AppointmentError> {
        let path = format!("/rest/v1/disabled_hours?date=eq.{}", date);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let hours: Vec<DisabledHour> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DisabledHour>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse disabled hours: {}", e)))?;

        Ok(hours.into_iter().map(|hour| (hour.date, hour.time)).collect())
    }

    async fn insert_appointment(&self, request: &BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        let now = Utc::now();

        let appointment_data = json!({
            "patient_id": request.patient_id,
            "date": request.date,
            "time": request.time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Pending.to_string(),
            "patient_note": request.patient_note,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .store
            .request_with_headers(Method::POST, "/rest/v1/appointments", Some(appointment_data), Some(headers))
            .await
            .map_err(|e| match e {
                // The partial unique indexes over active appointments close
                // the race between the availability read and this insert.
                StorageError::Conflict(_) => AppointmentError::SlotTaken,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        match result.into_iter().next() {
            Some(row) => parse_appointment(row),
            None => Err(AppointmentError::DatabaseError("Failed to create appointment".to_string())),
        }
    }

    async fn apply_status(
        &self,
        current: &Appointment,
        request: &UpdateStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(request.status.to_string()));

        // Preserve the previous note when none is supplied.
        if let Some(admin_note) = &request.admin_note {
            update_data.insert("admin_note".to_string(), json!(admin_note));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", current.id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .store
            .request_with_headers(Method::PATCH, &path, Some(Value::Object(update_data)), Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => parse_appointment(row),
            None => Err(AppointmentError::DatabaseError("Failed to update appointment".to_string())),
        }
    }

    /// Emit the single notification a successful transition owes. Runs
    /// after the status write has committed; a sink failure is surfaced
    /// without rolling the transition back.
    async fn emit_transition_notification(
        &self,
        appointment: &Appointment,
        request: &UpdateStatusRequest,
    ) -> Result<(), AppointmentError> {
        let note = request
            .admin_note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty());
        let when = format!("{} at {}", appointment.date, appointment.time.format("%H:%M"));

        match request.status {
            AppointmentStatus::Confirmed => {
                let message = format!("Your appointment for {} has been confirmed.", when);
                self.sink
                    .notify(appointment.patient_id, NotificationType::Confirmation, &message)
                    .await
                    .map_err(|e| AppointmentError::NotificationError(e.to_string()))?;
            }
            AppointmentStatus::Rejected => {
                let mut message = format!("Your appointment for {} was rejected.", when);
                if let Some(note) = note {
                    message.push_str(&format!(" Practitioner note: {}", note));
                }
                self.sink
                    .notify(appointment.patient_id, NotificationType::Rejection, &message)
                    .await
                    .map_err(|e| AppointmentError::NotificationError(e.to_string()))?;
            }
            AppointmentStatus::Cancelled => {
                // Only patient-initiated cancellations notify the
                // practitioner; admin cancellations stay silent.
                if request.source == Some(CancellationSource::User) {
                    let message = format!("The patient cancelled the appointment scheduled for {}.", when);
                    self.sink
                        .notify(self.practitioner_id, NotificationType::UserCancelled, &message)
                        .await
                        .map_err(|e| AppointmentError::NotificationError(e.to_string()))?;
                }
            }
            AppointmentStatus::Pending => {}
        }

        Ok(())
    }
}

pub(crate) fn parse_appointment(row: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}
