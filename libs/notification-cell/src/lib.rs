pub mod models;
pub mod services;
pub mod handlers;
pub mod router;

pub use models::*;
pub use services::sink::{NotificationService, NotificationSink, PostgrestNotificationSink};
pub use router::notification_routes;
