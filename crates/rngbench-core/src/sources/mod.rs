//! Concrete entropy sources.
//!
//! Each source wraps one external origin behind the [`EntropySource`] trait:
//! a public weather feed, a market price feed, TCP handshake timing to
//! geographically diverse endpoints, and the OS CSPRNG. None of these is a
//! reviewed entropy source; they exist so the benchmark has realistic
//! network-seeded generators to measure.
//!
//! [`EntropySource`]: crate::source::EntropySource

pub mod latency;
pub mod market;
pub mod system;
pub mod weather;

pub use latency::NetworkLatencySource;
pub use market::MarketSource;
pub use system::SystemRandomSource;
pub use weather::WeatherSource;
