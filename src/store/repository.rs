//! SQLite-backed store for observations and notification logs.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use super::models::{NotificationLog, Observation};

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid database URL '{url}': {source}")]
    InvalidUrl { url: String, source: sqlx::Error },
}

/// Handle to the SQLite database shared by the monitors and the CLI.
#[derive(Debug, Clone)]
pub struct SeatStore {
    pool: SqlitePool,
}

impl SeatStore {
    /// Open a lazy pool for `url`, creating the database file on first use.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|source| StoreError::InvalidUrl {
                url: url.to_string(),
                source,
            })?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_lazy_with(options);
        Ok(Self { pool })
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Begin a transaction covering one tick's writes.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// Observations for a match, newest first.
    pub async fn recent_observations(
        &self,
        match_id: &str,
        limit: i64,
    ) -> Result<Vec<Observation>, StoreError> {
        let rows = sqlx::query_as::<_, Observation>(
            "SELECT id, created_at, match_id, seats_available FROM observations \
             WHERE match_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(match_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Insert one observation inside the caller's transaction.
pub async fn record_observation(
    conn: &mut SqliteConnection,
    match_id: &str,
    seats_available: i64,
    created_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO observations (created_at, match_id, seats_available) VALUES (?1, ?2, ?3)",
    )
    .bind(created_at)
    .bind(match_id)
    .bind(seats_available)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert one delivered-notification row inside the caller's transaction.
#[allow(clippy::too_many_arguments)]
pub async fn record_notification(
    conn: &mut SqliteConnection,
    match_id: &str,
    channel: &str,
    subject: &str,
    message: Option<&str>,
    seats_available: Option<i64>,
    created_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO notification_logs \
         (created_at, match_id, channel, subject, message, seats_available) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(created_at)
    .bind(match_id)
    .bind(channel)
    .bind(subject)
    .bind(message)
    .bind(seats_available)
    .execute(conn)
    .await?;
    Ok(())
}

/// Most recent notification for `(match_id, channel)` in the window ending
/// at `now`. A window of zero or less never matches.
pub async fn last_notification_within(
    conn: &mut SqliteConnection,
    match_id: &str,
    channel: &str,
    within_seconds: i64,
    now: DateTime<Utc>,
) -> Result<Option<NotificationLog>, StoreError> {
    if within_seconds <= 0 {
        return Ok(None);
    }

    let cutoff = Duration::try_seconds(within_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let row = sqlx::query_as::<_, NotificationLog>(
        "SELECT id, created_at, match_id, channel, subject, message, seats_available \
         FROM notification_logs \
         WHERE match_id = ?1 AND channel = ?2 AND created_at >= ?3 \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(match_id)
    .bind(channel)
    .bind(cutoff)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}
