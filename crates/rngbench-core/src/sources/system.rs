//! OS CSPRNG as an entropy source.
//!
//! Used by the hybrid generator as the trustworthy arm: even with every
//! external feed compromised or down, the combined seed still carries a
//! fresh 32-byte OS-random sample.

use std::time::{Duration, Instant};

use crate::error::SourceError;
use crate::source::{EntropySource, Fetched, SourceInfo, SourceKind};

/// Number of OS-random bytes contributed per fetch.
const SAMPLE_BYTES: usize = 32;

/// Entropy source wrapping the platform's secure random generator.
pub struct SystemRandomSource {
    info: SourceInfo,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            info: SourceInfo {
                name: "system",
                description: "Platform secure random generator (getrandom)",
                kind: SourceKind::System,
            },
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemRandomSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn fetch(&self, _timeout: Duration) -> Result<Fetched, SourceError> {
        let start = Instant::now();
        let mut data = vec![0u8; SAMPLE_BYTES];
        getrandom::fill(&mut data).map_err(|e| SourceError::Transport {
            source: "system",
            detail: e.to_string(),
        })?;
        Ok(Fetched {
            data,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_source_returns_sample() {
        let src = SystemRandomSource::new();
        let fetched = src.fetch(Duration::from_secs(1)).expect("os rng");
        assert_eq!(fetched.data.len(), SAMPLE_BYTES);
    }

    #[test]
    fn successive_samples_differ() {
        let src = SystemRandomSource::new();
        let a = src.fetch(Duration::from_secs(1)).expect("os rng").data;
        let b = src.fetch(Duration::from_secs(1)).expect("os rng").data;
        assert_ne!(a, b);
    }
}
