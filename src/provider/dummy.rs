//! Deterministic pseudo-random seat source for demos and tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DummyProviderConfig;

use super::source::{FetchError, SeatProvider};

/// Emits seeded pseudo-random counts in `[min_seats, max_seats]` after a
/// short simulated network delay. Monitors share one RNG, so the sequence is
/// reproducible for a given seed and call order.
pub struct DummyProvider {
    rng: Mutex<StdRng>,
    min_seats: u32,
    max_seats: u32,
}

impl DummyProvider {
    pub fn new(config: &DummyProviderConfig) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            min_seats: config.min_seats,
            max_seats: config.max_seats,
        }
    }
}

#[async_trait]
impl SeatProvider for DummyProvider {
    async fn fetch_available_seats(&self, _match_id: &str) -> Result<u32, FetchError> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(self.rng.lock().gen_range(self.min_seats..=self.max_seats))
    }
}
