// libs/notification-cell/src/services/sink.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{Notification, NotificationError, NotificationType};

/// Recording seam for notification fan-out. Transition handlers talk to this
/// trait so the synchronous post-commit insert can later be swapped for an
/// outbox or queue without touching the callers.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationType,
        message: &str,
    ) -> Result<(), NotificationError>;
}

pub struct PostgrestNotificationSink {
    store: Arc<PostgrestClient>,
}

impl PostgrestNotificationSink {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(PostgrestClient::new(config)),
        }
    }

    pub fn with_store(store: Arc<PostgrestClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationSink for PostgrestNotificationSink {
    async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationType,
        message: &str,
    ) -> Result<(), NotificationError> {
        let body = json!({
            "recipient_id": recipient_id,
            "kind": kind.to_string(),
            "message": message,
            "created_at": Utc::now().to_rfc3339(),
        });

        self.store
            .execute(Method::POST, "/rest/v1/notifications", Some(body))
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        debug!("Stored {} notification for recipient {}", kind, recipient_id);
        Ok(())
    }
}

pub struct NotificationService {
    store: Arc<PostgrestClient>,
    retention_days: i64,
    window_days: i64,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(PostgrestClient::new(config)),
            retention_days: config.notification_retention_days,
            window_days: config.notification_window_days,
        }
    }

    /// List a recipient's notifications from the recent window, newest
    /// first. Expired rows are pruned before reading.
    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<Notification>, NotificationError> {
        self.prune_expired().await?;

        let cutoff = (Utc::now() - ChronoDuration::days(self.window_days)).to_rfc3339();
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            recipient_id,
            urlencoding::encode(&cutoff),
        );

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let notifications: Vec<Notification> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Notification>, _>>()
            .map_err(|e| {
                NotificationError::DatabaseError(format!("Failed to parse notifications: {}", e))
            })?;

        Ok(notifications)
    }

    async fn prune_expired(&self) -> Result<(), NotificationError> {
        let cutoff = (Utc::now() - ChronoDuration::days(self.retention_days)).to_rfc3339();
        let path = format!(
            "/rest/v1/notifications?created_at=lt.{}",
            urlencoding::encode(&cutoff),
        );

        self.store
            .execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        debug!("Pruned notifications older than {} days", self.retention_days);
        Ok(())
    }
}
