//! SMTP email channel.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{ConfigError, EmailNotifierConfig};
use crate::secrets;

use super::notifier::{DeliveryError, Notifier};

/// Sends the notification as a plain-text email. Addresses are validated
/// when the channel is built; credentials are resolved per send, so rotated
/// secrets take effect without a restart.
pub struct EmailNotifier {
    name: String,
    config: EmailNotifierConfig,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn new(name: &str, config: &EmailNotifierConfig) -> Result<Self, ConfigError> {
        let from = config.from_email.parse::<Mailbox>().map_err(|e| {
            ConfigError::Invalid(format!("notifier '{}': bad from_email: {}", name, e))
        })?;

        if config.to_emails.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "notifier '{}' has no to_emails",
                name
            )));
        }
        let to = config
            .to_emails
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>().map_err(|e| {
                    ConfigError::Invalid(format!(
                        "notifier '{}': bad to_email '{}': {}",
                        name, addr, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            config: config.clone(),
            from,
            to,
        })
    }

    /// Build the SMTP transport for the configured security mode: implicit
    /// TLS, STARTTLS upgrade, or plaintext when both are off.
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let host = self.config.smtp_host.as_str();
        let mut builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else if self.config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        } else {
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                host,
            ))
        }
        .map_err(|e| DeliveryError::Email(format!("SMTP transport for {}: {}", host, e)))?
        .port(self.config.smtp_port);

        let username = secrets::read_env_or_file(self.config.username_env.as_deref(), None);
        let password = secrets::read_env_or_file(
            self.config.password_env.as_deref(),
            self.config.password_file_env.as_deref(),
        );
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel_name(&self) -> &str {
        &self.name
    }

    async fn send(&self, subject: &str, message: Option<&str>) -> Result<(), DeliveryError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        let email = builder
            .body(message.unwrap_or_default().to_string())
            .map_err(|e| DeliveryError::Email(format!("Failed to build message: {}", e)))?;

        self.transport()?.send(email).await.map_err(|e| {
            DeliveryError::Email(format!("SMTP send via {}: {}", self.config.smtp_host, e))
        })?;

        tracing::debug!(
            channel = %self.name,
            recipients = self.to.len(),
            "Email notification sent"
        );
        Ok(())
    }
}
