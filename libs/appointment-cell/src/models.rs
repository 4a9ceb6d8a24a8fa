// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub patient_note: Option<String>,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// An active appointment holds its slot and counts against the
    /// one-per-patient-per-day limit.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Rejected | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub patient_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub admin_note: Option<String>,
    pub source: Option<CancellationSource>,
}

/// Who asked for a cancellation. Drives the notification wording: user
/// cancellations notify the practitioner, admin cancellations stay silent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancellationSource {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableDayRequest {
    pub date: NaiveDate,
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

// ==============================================================================
// BLACKOUT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisabledDay {
    pub date: NaiveDate,
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisabledHour {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

// ==============================================================================
// DAY SCHEDULE MODELS
// ==============================================================================

/// Every working-hour slot of a date with its bookable flag, so the
/// presentation layer renders availability without owning any rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub slots: Vec<SlotStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatus {
    pub time: NaiveTime,
    pub bookable: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Cannot book a date in the past")]
    PastDate,

    #[error("That day is disabled")]
    DayDisabled,

    #[error("That hour is disabled")]
    HourDisabled,

    #[error("That slot is already taken")]
    SlotTaken,

    #[error("Patient already has an appointment on that day")]
    DuplicatePatientBooking,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}
