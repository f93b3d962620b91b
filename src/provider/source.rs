//! Seat source trait and factory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ConfigError, ProviderConfig};

use super::dummy::DummyProvider;
use super::http_json::HttpJsonProvider;

/// Errors surfaced while fetching a seat count.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("No value at '{path}' in response")]
    PathNotFound { path: String },

    #[error("Value at '{path}' is not a seat count: {value}")]
    InvalidSeatCount { path: String, value: String },
}

/// A source of current seat availability.
#[async_trait]
pub trait SeatProvider: Send + Sync {
    /// Fetch the number of available seats for `match_id`.
    async fn fetch_available_seats(&self, match_id: &str) -> Result<u32, FetchError>;
}

/// Build the provider described by the config. All monitors share one
/// provider instance, so it comes back reference-counted.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn SeatProvider>, ConfigError> {
    match config {
        ProviderConfig::Dummy(dummy) => {
            if dummy.min_seats > dummy.max_seats {
                return Err(ConfigError::Invalid(format!(
                    "dummy provider: min_seats {} exceeds max_seats {}",
                    dummy.min_seats, dummy.max_seats
                )));
            }
            Ok(Arc::new(DummyProvider::new(dummy)))
        }
        ProviderConfig::HttpJson(http) => Ok(Arc::new(HttpJsonProvider::new(http)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DummyProviderConfig;

    #[test]
    fn test_dummy_range_must_be_ordered() {
        let config = ProviderConfig::Dummy(DummyProviderConfig {
            seed: 1,
            min_seats: 5,
            max_seats: 2,
        });
        assert!(build_provider(&config).is_err());
    }

    #[test]
    fn test_builds_dummy_provider() {
        let config = ProviderConfig::Dummy(DummyProviderConfig::default());
        assert!(build_provider(&config).is_ok());
    }
}
