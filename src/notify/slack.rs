//! Slack incoming-webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::SlackNotifierConfig;
use crate::secrets;

use super::notifier::{DeliveryError, Notifier};

/// Posts the notification text to a Slack incoming webhook. The webhook URL
/// is a secret resolved on first use and cached for the channel's lifetime.
pub struct SlackNotifier {
    name: String,
    config: SlackNotifierConfig,
    client: reqwest::Client,
    webhook_url: Mutex<Option<String>>,
}

impl SlackNotifier {
    pub fn new(name: &str, config: &SlackNotifierConfig) -> Self {
        Self {
            name: name.to_string(),
            config: config.clone(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            webhook_url: Mutex::new(None),
        }
    }

    fn resolve_url(&self) -> Result<String, DeliveryError> {
        let mut cached = self.webhook_url.lock();
        if let Some(url) = cached.as_ref() {
            return Ok(url.clone());
        }

        let url = secrets::read_env_or_file(
            self.config.webhook_url_env.as_deref(),
            self.config.webhook_url_file_env.as_deref(),
        )
        .ok_or_else(|| {
            DeliveryError::MissingSecret(format!(
                "Slack webhook URL for channel '{}'",
                self.name
            ))
        })?;
        *cached = Some(url.clone());
        Ok(url)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel_name(&self) -> &str {
        &self.name
    }

    async fn send(&self, subject: &str, message: Option<&str>) -> Result<(), DeliveryError> {
        let url = self.resolve_url()?;
        let payload = serde_json::json!({ "text": render_text(subject, message) });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Webhook(format!("Failed to post to Slack: {}", e)))?;

        if !response.status().is_success() {
            return Err(DeliveryError::Webhook(format!(
                "Slack webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(channel = %self.name, "Slack notification sent");
        Ok(())
    }
}

fn render_text(subject: &str, message: Option<&str>) -> String {
    match message {
        Some(body) if !body.is_empty() => format!("{}\n{}", subject, body),
        _ => subject.to_string(),
    }
}
