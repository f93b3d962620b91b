//! Seat availability sources.
//!
//! A [`SeatProvider`] answers "how many seats are free for this match right
//! now". The dummy source drives demos and tests; the HTTP JSON source polls
//! a real endpoint and extracts the count from the response.

mod dummy;
mod http_json;
mod source;

pub use dummy::DummyProvider;
pub use http_json::HttpJsonProvider;
pub use source::{build_provider, FetchError, SeatProvider};
