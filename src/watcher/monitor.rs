//! Per-monitor polling loop.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::MonitorConfig;
use crate::notify::{CompositeNotifier, DeliveryError};
use crate::provider::{FetchError, SeatProvider};
use crate::store::{self, SeatStore, StoreError};

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Seat count below the monitor's threshold.
    BelowThreshold,
    /// Threshold met, but the monitor has no channels configured.
    NoChannels,
    /// Threshold met, but a recent notification suppressed this one.
    Suppressed,
    /// Notifications delivered and logged.
    Notified,
}

/// Watcher errors.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One monitor's poll-check-notify loop.
pub struct MonitorLoop {
    config: MonitorConfig,
    provider: Arc<dyn SeatProvider>,
    notifier: CompositeNotifier,
    store: SeatStore,
}

impl MonitorLoop {
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn SeatProvider>,
        notifier: CompositeNotifier,
        store: SeatStore,
    ) -> Self {
        Self {
            config,
            provider,
            notifier,
            store,
        }
    }

    /// Run until `shutdown` flips. A failed tick is logged and the loop
    /// keeps its cadence.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            monitor = %self.config.name,
            match_id = %self.config.match_id,
            interval_seconds = self.config.poll_interval_seconds,
            threshold = self.config.seat_threshold_min,
            channels = ?self.notifier.channels(),
            "Starting monitor"
        );

        loop {
            match self.tick().await {
                Ok(outcome) => {
                    tracing::debug!(monitor = %self.config.name, ?outcome, "Tick finished");
                }
                Err(e) => {
                    tracing::error!(monitor = %self.config.name, error = %e, "Tick failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = shutdown.changed() => {
                    tracing::info!(monitor = %self.config.name, "Monitor shutting down");
                    break;
                }
            }
        }
    }

    /// One poll cycle: fetch, persist, threshold check, cooldown check,
    /// deliver, log. All writes share one transaction; a delivery failure
    /// rolls the whole tick back so the next cycle retries from scratch.
    pub async fn tick(&self) -> Result<TickOutcome, WatchError> {
        let seats = self
            .provider
            .fetch_available_seats(&self.config.match_id)
            .await?;
        tracing::debug!(
            monitor = %self.config.name,
            match_id = %self.config.match_id,
            seats,
            "Observed seat count"
        );
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        store::record_observation(&mut tx, &self.config.match_id, i64::from(seats), now).await?;

        if seats < self.config.seat_threshold_min {
            tx.commit().await.map_err(StoreError::from)?;
            return Ok(TickOutcome::BelowThreshold);
        }

        if self.notifier.is_empty() {
            tx.commit().await.map_err(StoreError::from)?;
            return Ok(TickOutcome::NoChannels);
        }

        // One recently-notified channel suppresses the whole dispatch, so a
        // monitor's channels never drift apart.
        let mut suppressed = false;
        for channel in self.notifier.channels() {
            let recent = store::last_notification_within(
                &mut tx,
                &self.config.match_id,
                channel,
                self.config.min_notify_interval_seconds,
                now,
            )
            .await?;
            if let Some(last) = recent {
                tracing::debug!(
                    monitor = %self.config.name,
                    channel = %channel,
                    last_notified_at = %last.created_at,
                    "Notification suppressed by cooldown"
                );
                suppressed = true;
            }
        }
        if suppressed {
            tx.commit().await.map_err(StoreError::from)?;
            return Ok(TickOutcome::Suppressed);
        }

        let subject = format!("Seats available for {}: {}", self.config.match_id, seats);
        let message = format!(
            "Monitor: {}\nMatch: {}\nSeats available: {}\n",
            self.config.name, self.config.match_id, seats
        );

        if let Err(e) = self.notifier.send_all(&subject, Some(&message)).await {
            tx.rollback().await.ok();
            return Err(e.into());
        }

        for channel in self.notifier.channels() {
            store::record_notification(
                &mut tx,
                &self.config.match_id,
                channel,
                &subject,
                Some(&message),
                Some(i64::from(seats)),
                now,
            )
            .await?;
        }
        tx.commit().await.map_err(StoreError::from)?;

        tracing::info!(
            monitor = %self.config.name,
            match_id = %self.config.match_id,
            seats,
            "Notification dispatched"
        );
        Ok(TickOutcome::Notified)
    }
}
