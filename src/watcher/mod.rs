//! Monitor loops and the service that runs them.
//!
//! Each configured monitor polls on its own cadence. One tick is fetch,
//! persist, threshold check, cooldown check, deliver, log, with all database
//! writes in a single transaction.

mod monitor;
mod service;

pub use monitor::{MonitorLoop, TickOutcome, WatchError};
pub use service::WatcherService;
