//! HTTP JSON seat source.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{ConfigError, HttpJsonProviderConfig, HttpMethod};

use super::source::{FetchError, SeatProvider};

/// Polls a JSON HTTP endpoint and reads the seat count at a configured dot
/// path. `{match_id}` placeholders in the URL and body templates are
/// replaced per request. Headers come from the literal `headers_json`
/// config, or from the JSON object in the `headers_env` variable when no
/// literal is set.
pub struct HttpJsonProvider {
    client: reqwest::Client,
    url_template: String,
    method: HttpMethod,
    seats_path: String,
    headers: HashMap<String, String>,
    body_template: Option<String>,
}

impl HttpJsonProvider {
    pub fn new(config: &HttpJsonProviderConfig) -> Result<Self, ConfigError> {
        if config.timeout_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "http_json provider: timeout_seconds must be positive, got {}",
                config.timeout_seconds
            )));
        }
        // NaN and values beyond the Duration range fail here.
        let timeout = Duration::try_from_secs_f64(config.timeout_seconds).map_err(|e| {
            ConfigError::Invalid(format!(
                "http_json provider: timeout_seconds {} is unusable: {}",
                config.timeout_seconds, e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
            method: config.method,
            seats_path: config.seats_path.clone(),
            headers: resolve_headers(config)?,
            body_template: config.body_template.clone(),
        })
    }
}

#[async_trait]
impl SeatProvider for HttpJsonProvider {
    async fn fetch_available_seats(&self, match_id: &str) -> Result<u32, FetchError> {
        let url = render_template(&self.url_template, match_id);

        let mut request = match self.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if self.method == HttpMethod::Post {
            if let Some(template) = &self.body_template {
                request = request.body(render_template(template, match_id));
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidJson(e.to_string()))?;

        extract_seats(&body, &self.seats_path)
    }
}

fn render_template(template: &str, match_id: &str) -> String {
    template.replace("{match_id}", match_id)
}

/// Request headers: the literal `headers_json` object when configured, else
/// the JSON object held by the `headers_env` variable.
fn resolve_headers(config: &HttpJsonProviderConfig) -> Result<HashMap<String, String>, ConfigError> {
    if let Some(raw) = &config.headers_json {
        return parse_headers(raw);
    }
    if let Some(var) = &config.headers_env {
        if let Ok(raw) = std::env::var(var) {
            if !raw.trim().is_empty() {
                return parse_headers(&raw);
            }
        }
    }
    Ok(HashMap::new())
}

fn parse_headers(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::InvalidHeadersJson(e.to_string()))
}

/// Walk a dot path (`data.seats`, `items.0.seats`) through the response and
/// coerce the leaf into a seat count.
fn extract_seats(body: &Value, path: &str) -> Result<u32, FetchError> {
    let value = lookup_path(body, path).ok_or_else(|| FetchError::PathNotFound {
        path: path.to_string(),
    })?;
    coerce_seats(value).ok_or_else(|| FetchError::InvalidSeatCount {
        path: path.to_string(),
        value: value.to_string(),
    })
}

fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Accepts non-negative integers, integral floats, and strings parsing as a
/// non-negative integer.
fn coerce_seats(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                u32::try_from(i).ok()
            } else if let Some(f) = n.as_f64() {
                if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
                    Some(f as u32)
                } else {
                    None
                }
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}
