//! Persisted rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One polled seat count.
#[derive(Debug, Clone, FromRow)]
pub struct Observation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub match_id: String,
    pub seats_available: i64,
}

/// One delivered notification, one row per channel.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationLog {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub match_id: String,
    pub channel: String,
    pub subject: String,
    pub message: Option<String>,
    pub seats_available: Option<i64>,
}
