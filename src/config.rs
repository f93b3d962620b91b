//! Watcher configuration: schema, loading, and validation.
//!
//! Configuration is a single TOML file. `${VAR}` / `${VAR:-default}`
//! references in string values are substituted from the environment before
//! deserialization, so one file deploys across environments with secrets
//! injected at runtime. Monitors reference notifiers by name; those
//! references are checked here so the watcher never starts with a dangling
//! channel.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Informational timezone label, echoed at startup.
    pub timezone: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://seatwatch.db`.
    pub url: String,
}

/// HTTP method for the http_json provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

/// Seat source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Deterministic pseudo-random source for demos and tests.
    Dummy(DummyProviderConfig),
    /// HTTP endpoint returning JSON.
    HttpJson(HttpJsonProviderConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DummyProviderConfig {
    pub seed: u64,
    pub min_seats: u32,
    pub max_seats: u32,
}

impl Default for DummyProviderConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            min_seats: 0,
            max_seats: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpJsonProviderConfig {
    /// Request URL; `{match_id}` is substituted per fetch.
    pub url_template: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Dot path to the seat count in the response, e.g. `data.seats`.
    /// Numeric segments index into arrays.
    pub seats_path: String,
    /// Literal JSON object of extra request headers.
    #[serde(default)]
    pub headers_json: Option<String>,
    /// Environment variable holding the same JSON object.
    #[serde(default)]
    pub headers_env: Option<String>,
    /// Optional request body; `{match_id}` is substituted per fetch.
    #[serde(default)]
    pub body_template: Option<String>,
}

/// Notification channel configuration, keyed by name under `[notifiers]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Writes notifications to the process log; never fails.
    Console,
    /// Slack incoming webhook.
    Slack(SlackNotifierConfig),
    /// SMTP email.
    Email(EmailNotifierConfig),
}

/// The webhook URL is a secret resolved at send time from
/// `webhook_url_env`, or from a file named by `webhook_url_file_env`
/// (file wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackNotifierConfig {
    #[serde(default)]
    pub webhook_url_env: Option<String>,
    #[serde(default)]
    pub webhook_url_file_env: Option<String>,
}

/// Credentials resolve env-or-file like the Slack webhook URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailNotifierConfig {
    pub from_email: String,
    pub to_emails: Vec<String>,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username_env: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub password_file_env: Option<String>,
    /// Connect with implicit TLS.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// When not using implicit TLS, upgrade the connection via STARTTLS.
    #[serde(default = "default_true")]
    pub use_starttls: bool,
}

/// One tracked match with its own cadence, threshold, and channel set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub name: String,
    pub match_id: String,
    /// Notify when the observed seat count reaches this value.
    #[serde(default = "default_threshold")]
    pub seat_threshold_min: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Notifier names from `[notifiers]`, in dispatch order.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Cooldown window per `(match_id, channel)`; `<= 0` disables it.
    #[serde(default = "default_notify_interval")]
    pub min_notify_interval_seconds: i64,
}

impl MonitorConfig {
    /// Poll cadence, floored at one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub notifiers: HashMap<String, NotifierConfig>,
    #[serde(default)]
    pub monitors: Vec<MonitorConfig>,
}

fn default_timeout_seconds() -> f64 {
    10.0
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> u32 {
    1
}

fn default_poll_interval() -> u64 {
    15
}

fn default_notify_interval() -> i64 {
    300
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Monitor '{monitor}' references unknown notifier '{channel}'")]
    UnknownNotifier { monitor: String, channel: String },

    #[error("Monitor '{monitor}' lists channel '{channel}' more than once")]
    DuplicateChannel { monitor: String, channel: String },

    #[error("headers_json is not valid JSON: {0}")]
    InvalidHeadersJson(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load a TOML config file, substitute environment references, validate.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw)
}

/// Parse an in-memory TOML document the same way [`load_config`] does.
pub fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let mut value: toml::Value = toml::from_str(raw)?;
    substitute_env(&mut value);
    let config: Config = value.try_into()?;
    validate(&config)?;
    Ok(config)
}

/// Substitute `${VAR}` / `${VAR:-default}` in every string value.
///
/// A missing variable without a default becomes the empty string, mirroring
/// shell substitution. Table keys are left untouched.
fn substitute_env(value: &mut toml::Value) {
    let pattern = Regex::new(r"\$\{([^:}]+)(?::-([^}]*))?\}").expect("valid env pattern");
    substitute_value(value, &pattern);
}

fn substitute_value(value: &mut toml::Value, pattern: &Regex) {
    match value {
        toml::Value::String(s) => {
            *s = pattern
                .replace_all(s, |caps: &Captures| {
                    let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    std::env::var(&caps[1]).unwrap_or_else(|_| default.to_string())
                })
                .into_owned();
        }
        toml::Value::Array(items) => {
            for item in items {
                substitute_value(item, pattern);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                substitute_value(item, pattern);
            }
        }
        _ => {}
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if let ProviderConfig::HttpJson(http) = &config.provider {
        if let Some(raw) = &http.headers_json {
            serde_json::from_str::<HashMap<String, String>>(raw)
                .map_err(|e| ConfigError::InvalidHeadersJson(e.to_string()))?;
        }
    }

    for monitor in &config.monitors {
        if monitor.match_id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "monitor '{}' has an empty match_id",
                monitor.name
            )));
        }

        let mut seen = HashSet::new();
        for channel in &monitor.channels {
            if !config.notifiers.contains_key(channel) {
                return Err(ConfigError::UnknownNotifier {
                    monitor: monitor.name.clone(),
                    channel: channel.clone(),
                });
            }
            if !seen.insert(channel.as_str()) {
                return Err(ConfigError::DuplicateChannel {
                    monitor: monitor.name.clone(),
                    channel: channel.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        [app]
        timezone = "Europe/Madrid"
        log_level = "debug"

        [database]
        url = "sqlite://seatwatch.db"

        [provider]
        type = "dummy"
        seed = 7
        min_seats = 0
        max_seats = 5

        [notifiers.console]
        type = "console"

        [notifiers.slack]
        type = "slack"
        webhook_url_env = "SLACK_WEBHOOK_URL"
        webhook_url_file_env = "SLACK_WEBHOOK_URL_FILE"

        [notifiers.email]
        type = "email"
        from_email = "watcher@example.com"
        to_emails = ["ops@example.com"]
        smtp_host = "smtp.example.com"
        smtp_port = 465
        use_tls = true

        [[monitors]]
        name = "main-stand"
        match_id = "match-123"
        seat_threshold_min = 2
        poll_interval_seconds = 30
        channels = ["console", "slack"]
        min_notify_interval_seconds = 600

        [[monitors]]
        name = "defaults"
        match_id = "match-456"
        channels = ["email"]
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL_CONFIG).unwrap();

        assert_eq!(config.app.timezone, "Europe/Madrid");
        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.database.url, "sqlite://seatwatch.db");
        assert!(matches!(
            config.provider,
            ProviderConfig::Dummy(DummyProviderConfig {
                seed: 7,
                min_seats: 0,
                max_seats: 5,
            })
        ));
        assert_eq!(config.notifiers.len(), 3);
        assert!(matches!(
            config.notifiers.get("console"),
            Some(NotifierConfig::Console)
        ));

        let first = &config.monitors[0];
        assert_eq!(first.seat_threshold_min, 2);
        assert_eq!(first.channels, vec!["console", "slack"]);
        assert_eq!(first.min_notify_interval_seconds, 600);
    }

    #[test]
    fn test_monitor_defaults() {
        let config = parse_config(FULL_CONFIG).unwrap();
        let defaults = &config.monitors[1];

        assert_eq!(defaults.seat_threshold_min, 1);
        assert_eq!(defaults.poll_interval_seconds, 15);
        assert_eq!(defaults.min_notify_interval_seconds, 300);
        assert_eq!(defaults.poll_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_poll_interval_floors_at_one_second() {
        let monitor = MonitorConfig {
            name: "m".to_string(),
            match_id: "x".to_string(),
            seat_threshold_min: 1,
            poll_interval_seconds: 0,
            channels: vec![],
            min_notify_interval_seconds: 0,
        };
        assert_eq!(monitor.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_http_json_provider() {
        let config = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "http_json"
            url_template = "https://api.example.com/matches/{match_id}"
            seats_path = "data.seats"
            "#,
        )
        .unwrap();

        match config.provider {
            ProviderConfig::HttpJson(http) => {
                assert_eq!(http.method, HttpMethod::Get);
                assert_eq!(http.timeout_seconds, 10.0);
                assert_eq!(http.seats_path, "data.seats");
                assert!(http.headers_json.is_none());
                assert!(http.body_template.is_none());
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SEATWATCH_TEST_CFG_URL", "sqlite://from-env.db");
        let config = parse_config(
            r#"
            [database]
            url = "${SEATWATCH_TEST_CFG_URL}"

            [provider]
            type = "http_json"
            url_template = "${SEATWATCH_TEST_CFG_MISSING:-https://fallback.example.com/{match_id}}"
            seats_path = "seats${SEATWATCH_TEST_CFG_ALSO_MISSING}"
            "#,
        )
        .unwrap();
        std::env::remove_var("SEATWATCH_TEST_CFG_URL");

        assert_eq!(config.database.url, "sqlite://from-env.db");
        match config.provider {
            ProviderConfig::HttpJson(http) => {
                assert_eq!(http.url_template, "https://fallback.example.com/{match_id}");
                // A missing variable without a default substitutes "".
                assert_eq!(http.seats_path, "seats");
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let err = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "dummy"

            [[monitors]]
            name = "m"
            match_id = "match-1"
            channels = ["nope"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNotifier { .. }));
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let err = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "dummy"

            [notifiers.console]
            type = "console"

            [[monitors]]
            name = "m"
            match_id = "match-1"
            channels = ["console", "console"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateChannel { .. }));
    }

    #[test]
    fn test_empty_match_id_rejected() {
        let err = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "dummy"

            [[monitors]]
            name = "m"
            match_id = "  "
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_headers_json_rejected() {
        let err = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "http_json"
            url_template = "https://api.example.com/{match_id}"
            seats_path = "seats"
            headers_json = "not json"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeadersJson(_)));
    }

    #[test]
    fn test_unknown_provider_type_rejected() {
        let err = parse_config(
            r#"
            [database]
            url = "sqlite://x.db"

            [provider]
            type = "carrier-pigeon"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
