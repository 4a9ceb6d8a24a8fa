// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};

/// One active appointment per patient per calendar day. Evaluated before
/// any slot-level rule so the caller gets the distinct error reason.
pub fn check_patient_day(
    patient_id: Uuid,
    date: NaiveDate,
    appointments: &[Appointment],
) -> Result<(), AppointmentError> {
    let already_booked = appointments
        .iter()
        .any(|apt| apt.patient_id == patient_id && apt.date == date && apt.is_active());

    if already_booked {
        return Err(AppointmentError::DuplicatePatientBooking);
    }

    Ok(())
}

/// Slot-level availability rules, evaluated in order; the first failure
/// wins. `today` is passed in so the policy stays deterministic under test.
pub fn check_slot(
    date: NaiveDate,
    time: NaiveTime,
    today: NaiveDate,
    appointments: &[Appointment],
    disabled_days: &HashSet<NaiveDate>,
    disabled_hours: &HashSet<(NaiveDate, NaiveTime)>,
) -> Result<(), AppointmentError> {
    if date < today {
        return Err(AppointmentError::PastDate);
    }

    if disabled_days.contains(&date) {
        return Err(AppointmentError::DayDisabled);
    }

    if disabled_hours.contains(&(date, time)) {
        return Err(AppointmentError::HourDisabled);
    }

    let taken = appointments
        .iter()
        .any(|apt| apt.date == date && apt.time == time && apt.is_active());

    if taken {
        return Err(AppointmentError::SlotTaken);
    }

    Ok(())
}

pub fn is_bookable(
    date: NaiveDate,
    time: NaiveTime,
    today: NaiveDate,
    appointments: &[Appointment],
    disabled_days: &HashSet<NaiveDate>,
    disabled_hours: &HashSet<(NaiveDate, NaiveTime)>,
) -> bool {
    check_slot(date, time, today, appointments, disabled_days, disabled_hours).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Utc};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn hour(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn appointment(patient_id: Uuid, date: NaiveDate, time: NaiveTime, status: AppointmentStatus) -> Appointment {
        let stamp: DateTime<Utc> = "2025-06-01T09:00:00Z".parse().unwrap();
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            date,
            time,
            status,
            patient_note: None,
            admin_note: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn past_dates_are_never_bookable() {
        let today = day("2025-06-10");

        let result = check_slot(day("2025-06-09"), hour(10), today, &[], &HashSet::new(), &HashSet::new());

        assert_matches!(result, Err(AppointmentError::PastDate));
        // Booking on the current day itself is allowed.
        assert!(is_bookable(today, hour(10), today, &[], &HashSet::new(), &HashSet::new()));
    }

    #[test]
    fn disabled_day_blocks_every_slot() {
        let today = day("2025-06-10");
        let disabled_days: HashSet<NaiveDate> = [day("2025-06-12")].into_iter().collect();

        for h in 8..17 {
            let result = check_slot(day("2025-06-12"), hour(h), today, &[], &disabled_days, &HashSet::new());
            assert_matches!(result, Err(AppointmentError::DayDisabled));
        }
    }

    #[test]
    fn disabled_hour_blocks_even_without_disabled_day() {
        let today = day("2025-06-10");
        let disabled_hours: HashSet<(NaiveDate, NaiveTime)> =
            [(day("2025-06-12"), hour(10))].into_iter().collect();

        let blocked = check_slot(day("2025-06-12"), hour(10), today, &[], &HashSet::new(), &disabled_hours);
        assert_matches!(blocked, Err(AppointmentError::HourDisabled));

        // The neighboring slot on the same day stays open.
        assert!(is_bookable(day("2025-06-12"), hour(11), today, &[], &HashSet::new(), &disabled_hours));
    }

    #[test]
    fn active_appointment_takes_the_slot() {
        let today = day("2025-06-10");
        let taken = [appointment(Uuid::new_v4(), day("2025-06-12"), hour(10), AppointmentStatus::Confirmed)];

        let result = check_slot(day("2025-06-12"), hour(10), today, &taken, &HashSet::new(), &HashSet::new());

        assert_matches!(result, Err(AppointmentError::SlotTaken));
    }

    #[test]
    fn retired_appointment_frees_the_slot() {
        let today = day("2025-06-10");
        let cancelled = [appointment(Uuid::new_v4(), day("2025-06-12"), hour(10), AppointmentStatus::Cancelled)];
        let rejected = [appointment(Uuid::new_v4(), day("2025-06-12"), hour(10), AppointmentStatus::Rejected)];

        assert!(is_bookable(day("2025-06-12"), hour(10), today, &cancelled, &HashSet::new(), &HashSet::new()));
        assert!(is_bookable(day("2025-06-12"), hour(10), today, &rejected, &HashSet::new(), &HashSet::new()));
    }

    #[test]
    fn patient_holding_active_appointment_cannot_book_again_that_day() {
        let patient = Uuid::new_v4();
        let date = day("2025-06-10");
        let existing = [appointment(patient, date, hour(10), AppointmentStatus::Pending)];

        // The 11:00 slot itself is free; the patient-per-day guard still fires.
        let result = check_patient_day(patient, date, &existing);
        assert_matches!(result, Err(AppointmentError::DuplicatePatientBooking));

        assert!(check_patient_day(Uuid::new_v4(), date, &existing).is_ok());
        assert!(check_patient_day(patient, day("2025-06-11"), &existing).is_ok());
    }

    #[test]
    fn cancelled_appointment_does_not_count_against_patient_limit() {
        let patient = Uuid::new_v4();
        let date = day("2025-06-10");
        let existing = [appointment(patient, date, hour(10), AppointmentStatus::Cancelled)];

        assert!(check_patient_day(patient, date, &existing).is_ok());
    }

    #[test]
    fn past_date_outranks_other_rules() {
        let today = day("2025-06-10");
        let date = day("2025-06-01");
        let disabled_days: HashSet<NaiveDate> = [date].into_iter().collect();
        let taken = [appointment(Uuid::new_v4(), date, hour(10), AppointmentStatus::Pending)];

        let result = check_slot(date, hour(10), today, &taken, &disabled_days, &HashSet::new());

        assert_matches!(result, Err(AppointmentError::PastDate));
    }
}
