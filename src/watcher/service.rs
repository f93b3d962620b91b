//! Watcher service: shared components plus one loop per monitor.

use futures::future::join_all;
use tokio::sync::watch;

use crate::config::{Config, ConfigError};
use crate::notify::build_notifier;
use crate::provider::build_provider;
use crate::store::SeatStore;

use super::monitor::MonitorLoop;

/// Builds the provider once, then wires each configured monitor to it and
/// to the shared store.
pub struct WatcherService {
    monitors: Vec<MonitorLoop>,
}

impl WatcherService {
    pub fn build(config: &Config, store: SeatStore) -> Result<Self, ConfigError> {
        let provider = build_provider(&config.provider)?;

        let mut monitors = Vec::with_capacity(config.monitors.len());
        for monitor in &config.monitors {
            let notifier = build_notifier(&config.notifiers, &monitor.channels)?;
            if notifier.is_empty() {
                tracing::warn!(
                    monitor = %monitor.name,
                    "Monitor has no notification channels and will only record observations"
                );
            }
            monitors.push(MonitorLoop::new(
                monitor.clone(),
                provider.clone(),
                notifier,
                store.clone(),
            ));
        }

        Ok(Self { monitors })
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Spawn every monitor and wait for all of them to stop.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let handles: Vec<_> = self
            .monitors
            .into_iter()
            .map(|monitor| tokio::spawn(monitor.run(shutdown.clone())))
            .collect();

        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Monitor task panicked");
            }
        }
        tracing::info!("All monitors stopped");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::parse_config;

    async fn test_store() -> (TempDir, SeatStore) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("service-test.db").display());
        let store = SeatStore::connect(&url).unwrap();
        store.migrate().await.unwrap();
        (dir, store)
    }

    fn two_monitor_config() -> Config {
        parse_config(
            r#"
            [database]
            url = "sqlite://unused.db"

            [provider]
            type = "dummy"
            seed = 3

            [notifiers.console]
            type = "console"

            [[monitors]]
            name = "north"
            match_id = "match-1"
            poll_interval_seconds = 1
            channels = ["console"]

            [[monitors]]
            name = "south"
            match_id = "match-2"
            poll_interval_seconds = 1
            channels = []
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_wires_every_monitor() {
        let (_dir, store) = test_store().await;
        let service = WatcherService::build(&two_monitor_config(), store).unwrap();
        assert_eq!(service.monitors.len(), 2);
        assert!(!service.is_empty());
    }

    #[tokio::test]
    async fn test_service_stops_on_shutdown() {
        let (_dir, store) = test_store().await;
        let service = WatcherService::build(&two_monitor_config(), store).unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(service.run(rx));
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("service should stop")
            .unwrap();
    }
}
