use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub postgrest_url: String,
    pub postgrest_api_key: String,
    pub practitioner_id: Uuid,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            postgrest_url: "http://localhost:54321".to_string(),
            postgrest_api_key: "test-api-key".to_string(),
            practitioner_id: Uuid::new_v4(),
        }
    }
}

impl TestConfig {
    /// Point the config at a wiremock server.
    pub fn for_mock_server(url: &str) -> Self {
        Self {
            postgrest_url: url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            postgrest_url: self.postgrest_url.clone(),
            postgrest_api_key: self.postgrest_api_key.clone(),
            practitioner_id: self.practitioner_id,
            work_start_hour: 8,
            work_end_hour: 17,
            notification_retention_days: 90,
            notification_window_days: 7,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST rows for wiremock response bodies.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn appointment(id: Uuid, patient_id: Uuid, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "date": date,
            "time": time,
            "status": status,
            "patient_note": null,
            "admin_note": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        })
    }

    pub fn disabled_day(date: &str, admin_note: Option<&str>) -> Value {
        json!({
            "date": date,
            "admin_note": admin_note,
        })
    }

    pub fn disabled_hour(date: &str, time: &str) -> Value {
        json!({
            "date": date,
            "time": time,
        })
    }

    pub fn notification(recipient_id: Uuid, kind: &str, message: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "recipient_id": recipient_id,
            "kind": kind,
            "message": message,
            "created_at": Utc::now().to_rfc3339(),
        })
    }
}
