//! Weather feed entropy source.
//!
//! Fetches the full wttr.in JSON report. The payload changes with global
//! weather conditions and server-side formatting; round-trip timing adds a
//! little more. Dubious entropy quality by design — that is what the
//! benchmark is for.

use std::time::{Duration, Instant};

use crate::error::SourceError;
use crate::source::{EntropySource, Fetched, SourceInfo, SourceKind};

const WEATHER_URL: &str = "https://wttr.in/?format=j1";

/// Entropy source backed by the wttr.in weather API.
pub struct WeatherSource {
    info: SourceInfo,
    url: String,
}

impl WeatherSource {
    pub fn new() -> Self {
        Self::with_url(WEATHER_URL)
    }

    /// Point the source at a different endpoint (tests use a local server).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            info: SourceInfo {
                name: "weather",
                description: "Global weather report JSON from wttr.in",
                kind: SourceKind::Weather,
            },
            url: url.into(),
        }
    }
}

impl Default for WeatherSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for WeatherSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn fetch(&self, timeout: Duration) -> Result<Fetched, SourceError> {
        http_fetch("weather", &self.url, timeout)
    }
}

/// Shared blocking HTTP GET with a hard per-call timeout.
///
/// Used by the weather and market sources. The client timeout covers
/// connect, request, and body read, so the caller's lock is never held
/// longer than `timeout` plus scheduling noise.
pub(crate) fn http_fetch(
    name: &'static str,
    url: &str,
    timeout: Duration,
) -> Result<Fetched, SourceError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Transport {
            source: name,
            detail: e.to_string(),
        })?;

    let start = Instant::now();
    let response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            SourceError::Timeout {
                source: name,
                elapsed: start.elapsed(),
            }
        } else {
            SourceError::Transport {
                source: name,
                detail: e.to_string(),
            }
        }
    })?;

    let body = response.bytes().map_err(|e| {
        if e.is_timeout() {
            SourceError::Timeout {
                source: name,
                elapsed: start.elapsed(),
            }
        } else {
            SourceError::Malformed {
                source: name,
                detail: e.to_string(),
            }
        }
    })?;

    Ok(Fetched {
        data: body.to_vec(),
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_source_info() {
        let src = WeatherSource::new();
        assert_eq!(src.name(), "weather");
        assert_eq!(src.info().kind, SourceKind::Weather);
    }

    #[test]
    fn unreachable_endpoint_fails_fast() {
        // Reserved TEST-NET-1 address: connect fails or times out quickly.
        let src = WeatherSource::with_url("http://192.0.2.1/");
        let started = Instant::now();
        let result = src.fetch(Duration::from_millis(300));
        assert!(result.is_err());
        // Bounded by the timeout, with slack for connect scheduling.
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.unwrap_err().source_name(), "weather");
    }
}
