//! Market price feed entropy source.
//!
//! Fetches the current bitcoin spot price. A single slowly-moving number is
//! a weak contribution on its own; it is only ever combined with other
//! sources and timing data.

use std::time::Duration;

use crate::error::SourceError;
use crate::source::{EntropySource, Fetched, SourceInfo, SourceKind};
use crate::sources::weather::http_fetch;

const MARKET_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

/// Entropy source backed by the coingecko simple-price API.
pub struct MarketSource {
    info: SourceInfo,
    url: String,
}

impl MarketSource {
    pub fn new() -> Self {
        Self::with_url(MARKET_URL)
    }

    /// Point the source at a different endpoint (tests use a local server).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            info: SourceInfo {
                name: "market",
                description: "Bitcoin spot price from the coingecko API",
                kind: SourceKind::Market,
            },
            url: url.into(),
        }
    }
}

impl Default for MarketSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for MarketSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn fetch(&self, timeout: Duration) -> Result<Fetched, SourceError> {
        http_fetch("market", &self.url, timeout)
    }
}
