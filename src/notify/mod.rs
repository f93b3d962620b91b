//! Notification channels.
//!
//! Channels implement [`Notifier`]. A monitor's configured channels are
//! wrapped in a [`CompositeNotifier`] that dispatches in order and treats
//! the first failure as a failure of the whole dispatch.

mod console;
mod email;
mod notifier;
mod slack;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;
pub use notifier::{build_notifier, CompositeNotifier, DeliveryError, Notifier};
pub use slack::SlackNotifier;
