// libs/appointment-cell/src/services/slots.rs
use chrono::{NaiveTime, Timelike};
use tracing::warn;

use shared_config::AppConfig;

pub const DEFAULT_START_HOUR: u32 = 8;
pub const DEFAULT_END_HOUR: u32 = 17;

/// Enumerates the bookable time-of-day slots between a start hour and an
/// end hour (exclusive), one per hour. Pure function of configuration.
#[derive(Debug, Clone, Copy)]
pub struct SlotCalendar {
    start_hour: u32,
    end_hour: u32,
}

impl SlotCalendar {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        if start_hour >= end_hour || end_hour > 24 {
            warn!(
                "Invalid working hours {}..{}, falling back to {}..{}",
                start_hour, end_hour, DEFAULT_START_HOUR, DEFAULT_END_HOUR
            );
            return Self {
                start_hour: DEFAULT_START_HOUR,
                end_hour: DEFAULT_END_HOUR,
            };
        }

        Self { start_hour, end_hour }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.work_start_hour, config.work_end_hour)
    }

    /// Ordered slot starts for a day. The end hour is exclusive: working
    /// hours 8..17 yield 08:00 through 16:00.
    pub fn slots(&self) -> Vec<NaiveTime> {
        (self.start_hour..self.end_hour)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .collect()
    }

    /// Whether a time lies on a slot boundary inside working hours.
    pub fn contains(&self, time: NaiveTime) -> bool {
        time.minute() == 0
            && time.second() == 0
            && time.hour() >= self.start_hour
            && time.hour() < self.end_hour
    }
}

impl Default for SlotCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_START_HOUR, DEFAULT_END_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hours_yield_nine_hourly_slots() {
        let slots = SlotCalendar::default().slots();

        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0], NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slots[8], NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn enumeration_is_deterministic() {
        let calendar = SlotCalendar::new(9, 13);

        assert_eq!(calendar.slots(), calendar.slots());
        assert_eq!(calendar.slots().len(), 4);
    }

    #[test]
    fn contains_accepts_slot_boundaries_only() {
        let calendar = SlotCalendar::default();

        assert!(calendar.contains(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(calendar.contains(NaiveTime::from_hms_opt(16, 0, 0).unwrap()));
        assert!(!calendar.contains(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        assert!(!calendar.contains(NaiveTime::from_hms_opt(10, 30, 0).unwrap()));
        assert!(!calendar.contains(NaiveTime::from_hms_opt(7, 0, 0).unwrap()));
    }

    #[test]
    fn invalid_configuration_falls_back_to_defaults() {
        let calendar = SlotCalendar::new(17, 8);

        assert_eq!(calendar.slots().len(), 9);
    }
}
