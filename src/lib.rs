//! Seatwatch: seat availability watcher with threshold notifications
//!
//! Polls a seat availability source for a set of configured matches, records
//! every observation, and notifies the configured channels when the count
//! reaches a monitor's threshold. A per-`(match, channel)` cooldown keeps
//! repeat notifications quiet.
//!
//! # Features
//!
//! - **Providers**: deterministic dummy source, HTTP JSON source with a
//!   configurable extraction path
//! - **Channels**: console log, Slack incoming webhook, SMTP email
//! - **Cooldown dedup**: per-`(match_id, channel)` window, shared across
//!   monitors watching the same match
//! - **Transactional ticks**: an observation and its notification rows
//!   commit together or not at all
//! - **Env-or-file secrets**: webhook URLs and SMTP credentials resolve from
//!   the environment or from mounted secret files
//!
//! # Example
//!
//! ```no_run
//! use seatwatch::config::load_config;
//! use seatwatch::store::SeatStore;
//! use seatwatch::watcher::WatcherService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("config.toml")?;
//!     let store = SeatStore::connect(&config.database.url)?;
//!     store.migrate().await?;
//!
//!     let service = WatcherService::build(&config, store)?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     service.run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod notify;
pub mod provider;
pub mod secrets;
pub mod store;
pub mod watcher;

// Re-export commonly used types
pub use config::{load_config, Config, ConfigError};
pub use store::SeatStore;
pub use watcher::{WatchError, WatcherService};
