//! Console channel.

use async_trait::async_trait;

use super::notifier::{DeliveryError, Notifier};

/// Writes the notification to the process log at info level. Always-on
/// channel for demos and a smoke test for the dispatch path.
pub struct ConsoleNotifier {
    name: String,
}

impl ConsoleNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn channel_name(&self) -> &str {
        &self.name
    }

    async fn send(&self, subject: &str, message: Option<&str>) -> Result<(), DeliveryError> {
        match message {
            Some(body) if !body.is_empty() => {
                tracing::info!(channel = %self.name, "[CONSOLE] {}\n{}", subject, body)
            }
            _ => tracing::info!(channel = %self.name, "[CONSOLE] {}", subject),
        }
        Ok(())
    }
}
