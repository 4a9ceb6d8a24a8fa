use std::env;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub postgrest_url: String,
    pub postgrest_api_key: String,
    pub practitioner_id: Uuid,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub notification_retention_days: i64,
    pub notification_window_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            postgrest_url: env::var("POSTGREST_URL")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_URL not set, using empty value");
                    String::new()
                }),
            postgrest_api_key: env::var("POSTGREST_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_API_KEY not set, using empty value");
                    String::new()
                }),
            practitioner_id: env::var("PRACTITIONER_ID")
                .ok()
                .and_then(|raw| Uuid::parse_str(&raw).ok())
                .unwrap_or_else(|| {
                    warn!("PRACTITIONER_ID not set or invalid, using nil id");
                    Uuid::nil()
                }),
            work_start_hour: parse_hour("WORK_START_HOUR", 8),
            work_end_hour: parse_hour("WORK_END_HOUR", 17),
            notification_retention_days: parse_days("NOTIFICATION_RETENTION_DAYS", 90),
            notification_window_days: parse_days("NOTIFICATION_WINDOW_DAYS", 7),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.postgrest_url.is_empty()
            && !self.postgrest_api_key.is_empty()
            && !self.practitioner_id.is_nil()
    }
}

fn parse_hour(var: &str, default: u32) -> u32 {
    match env::var(var).ok().and_then(|raw| raw.parse::<u32>().ok()) {
        Some(hour) if hour < 24 => hour,
        Some(hour) => {
            warn!("{} = {} is not a valid hour, using default {}", var, hour, default);
            default
        }
        None => default,
    }
}

fn parse_days(var: &str, default: i64) -> i64 {
    match env::var(var).ok().and_then(|raw| raw.parse::<i64>().ok()) {
        Some(days) if days > 0 => days,
        Some(days) => {
            warn!("{} = {} is not a valid day count, using default {}", var, days, default);
            default
        }
        None => default,
    }
}
