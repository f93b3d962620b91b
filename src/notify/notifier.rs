//! Channel trait, fan-out, and factory.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::{ConfigError, NotifierConfig};

use super::console::ConsoleNotifier;
use super::email::EmailNotifier;
use super::slack::SlackNotifier;

/// Delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Email error: {0}")]
    Email(String),
}

/// One delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name the monitor configuration references this channel by.
    fn channel_name(&self) -> &str;

    /// Deliver a notification. `message` extends the subject with a body on
    /// channels that support one.
    async fn send(&self, subject: &str, message: Option<&str>) -> Result<(), DeliveryError>;
}

/// Fans a notification out to a monitor's channels in configuration order.
pub struct CompositeNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Channel names in dispatch order.
    pub fn channels(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.channel_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Deliver to every channel, stopping at the first failure so the caller
    /// can treat the whole dispatch as undelivered.
    pub async fn send_all(
        &self,
        subject: &str,
        message: Option<&str>,
    ) -> Result<(), DeliveryError> {
        for notifier in &self.notifiers {
            notifier.send(subject, message).await?;
        }
        Ok(())
    }
}

/// Build the composite for `channels`, resolving each name against the
/// `[notifiers]` table.
pub fn build_notifier(
    configs: &HashMap<String, NotifierConfig>,
    channels: &[String],
) -> Result<CompositeNotifier, ConfigError> {
    let mut built: Vec<Box<dyn Notifier>> = Vec::with_capacity(channels.len());
    for channel in channels {
        let config = configs
            .get(channel)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown notifier '{}'", channel)))?;
        let notifier: Box<dyn Notifier> = match config {
            NotifierConfig::Console => Box::new(ConsoleNotifier::new(channel)),
            NotifierConfig::Slack(slack) => Box::new(SlackNotifier::new(channel, slack)),
            NotifierConfig::Email(email) => Box::new(EmailNotifier::new(channel, email)?),
        };
        built.push(notifier);
    }
    Ok(CompositeNotifier::new(built))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::config::SlackNotifierConfig;

    struct StubNotifier {
        name: &'static str,
        fail: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Notifier for StubNotifier {
        fn channel_name(&self) -> &str {
            self.name
        }

        async fn send(
            &self,
            _subject: &str,
            _message: Option<&str>,
        ) -> Result<(), DeliveryError> {
            self.calls.lock().push(self.name);
            if self.fail {
                Err(DeliveryError::Webhook("stub failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_send_all_dispatches_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeNotifier::new(vec![
            Box::new(StubNotifier {
                name: "first",
                fail: false,
                calls: calls.clone(),
            }),
            Box::new(StubNotifier {
                name: "second",
                fail: false,
                calls: calls.clone(),
            }),
        ]);

        composite.send_all("subject", None).await.unwrap();
        assert_eq!(*calls.lock(), vec!["first", "second"]);
        assert_eq!(composite.channels(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_send_all_stops_at_first_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeNotifier::new(vec![
            Box::new(StubNotifier {
                name: "first",
                fail: false,
                calls: calls.clone(),
            }),
            Box::new(StubNotifier {
                name: "second",
                fail: true,
                calls: calls.clone(),
            }),
            Box::new(StubNotifier {
                name: "third",
                fail: false,
                calls: calls.clone(),
            }),
        ]);

        let result = composite.send_all("subject", None).await;
        assert!(result.is_err());
        // The third channel is never reached.
        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_build_notifier_resolves_channels_in_order() {
        let mut configs = HashMap::new();
        configs.insert("console".to_string(), NotifierConfig::Console);
        configs.insert(
            "slack".to_string(),
            NotifierConfig::Slack(SlackNotifierConfig::default()),
        );

        let composite =
            build_notifier(&configs, &["slack".to_string(), "console".to_string()]).unwrap();
        assert_eq!(composite.channels(), vec!["slack", "console"]);
        assert!(!composite.is_empty());
    }

    #[test]
    fn test_build_notifier_rejects_unknown_channel() {
        let configs = HashMap::new();
        assert!(build_notifier(&configs, &["nope".to_string()]).is_err());
    }
}
