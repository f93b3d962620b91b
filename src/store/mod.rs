//! Persistence: polled observations and the notification log.
//!
//! Tick writes go through one transaction held by the caller, so an
//! observation and its notification rows commit together or not at all.

mod models;
mod repository;

pub use models::{NotificationLog, Observation};
pub use repository::{
    last_notification_within, record_notification, record_observation, SeatStore, StoreError,
};
