//! Abstract entropy source trait and concurrent seed-material gathering.
//!
//! Every entropy source implements the [`EntropySource`] trait: a single
//! timeout-bounded `fetch` that returns a byte blob plus its own elapsed
//! time, or a tagged [`SourceError`]. [`gather`] fans out over a set of
//! sources in parallel, joins all of them, substitutes a fixed fallback for
//! each failure, and compresses everything into a 32-byte digest.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::SourceError;

/// Upper bound on payload bytes folded into the combiner per source.
/// Responses are hashed regardless of size; the cap only bounds memory.
pub const MAX_SOURCE_BYTES: usize = 16 * 1024;

/// What kind of origin a source wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Public weather feed.
    Weather,
    /// Market price feed.
    Market,
    /// Network round-trip timing.
    NetworkTiming,
    /// Operating system CSPRNG.
    System,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weather => write!(f, "weather"),
            Self::Market => write!(f, "market"),
            Self::NetworkTiming => write!(f, "network_timing"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Metadata about an entropy source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Unique identifier (e.g. `"weather"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Origin classification.
    pub kind: SourceKind,
}

/// Successful fetch: the payload and how long it took.
///
/// Both fields are folded into the seed-material combiner — round-trip
/// timing carries entropy of its own.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub data: Vec<u8>,
    pub elapsed: Duration,
}

/// Trait that every entropy source must implement.
pub trait EntropySource: Send + Sync {
    /// Source metadata.
    fn info(&self) -> &SourceInfo;

    /// Fetch one blob of seed material, bounding own latency to `timeout`.
    ///
    /// On exceeding the budget the implementation must return
    /// [`SourceError::Timeout`] rather than blocking the caller.
    fn fetch(&self, timeout: Duration) -> Result<Fetched, SourceError>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}

/// Fixed contribution substituted for a failed source so seed derivation
/// proceeds deterministically-but-degraded instead of aborting.
fn fallback_contribution(name: &str) -> Vec<u8> {
    format!("{name}:unavailable").into_bytes()
}

/// Gather seed material from every source concurrently and combine it.
///
/// Fan-out/barrier semantics: one scoped thread per source, and the combine
/// step does not run until every source has either returned or failed. A
/// failed source contributes [`fallback_contribution`] tagged with its name.
/// The combiner hashes, per source, the (capped) payload and the elapsed
/// round-trip nanoseconds, plus one wall-clock timestamp at the end.
///
/// Never fails: with every source down the digest still moves, it just
/// carries less entropy than advertised.
pub fn gather(sources: &[Box<dyn EntropySource>], timeout: Duration) -> [u8; 32] {
    let mut contributions: Vec<(Vec<u8>, Duration)> = Vec::with_capacity(sources.len());

    std::thread::scope(|s| {
        let handles: Vec<_> = sources
            .iter()
            .map(|src| s.spawn(move || (src.name(), src.fetch(timeout))))
            .collect();

        for handle in handles {
            // A panicking source is treated the same as a failing one.
            let (name, outcome) = match handle.join() {
                Ok(pair) => pair,
                Err(_) => {
                    log::warn!("entropy source panicked; substituting fallback");
                    contributions.push((fallback_contribution("panicked"), Duration::ZERO));
                    continue;
                }
            };
            match outcome {
                Ok(mut fetched) => {
                    fetched.data.truncate(MAX_SOURCE_BYTES);
                    contributions.push((fetched.data, fetched.elapsed));
                }
                Err(err) => {
                    log::warn!("entropy source failed: {err}");
                    contributions.push((fallback_contribution(name), Duration::ZERO));
                }
            }
        }
    });

    let mut h = Sha256::new();
    for (data, elapsed) in &contributions {
        h.update((data.len() as u64).to_be_bytes());
        h.update(data);
        h.update((elapsed.as_nanos() as u64).to_be_bytes());
    }
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    h.update(ts.as_nanos().to_le_bytes());
    h.finalize().into()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Deterministic mock source returning fixed data.
    pub struct MockSource {
        info: SourceInfo,
        data: Vec<u8>,
    }

    impl MockSource {
        pub fn new(name: &'static str, data: Vec<u8>) -> Self {
            Self {
                info: SourceInfo {
                    name,
                    description: "mock source",
                    kind: SourceKind::System,
                },
                data,
            }
        }
    }

    impl EntropySource for MockSource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }
        fn fetch(&self, _timeout: Duration) -> Result<Fetched, SourceError> {
            Ok(Fetched {
                data: self.data.clone(),
                elapsed: Duration::from_micros(10),
            })
        }
    }

    /// Mock source that always fails with a transport error.
    pub struct FailingSource {
        info: SourceInfo,
    }

    impl FailingSource {
        pub fn new(name: &'static str) -> Self {
            Self {
                info: SourceInfo {
                    name,
                    description: "failing mock",
                    kind: SourceKind::NetworkTiming,
                },
            }
        }
    }

    impl EntropySource for FailingSource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }
        fn fetch(&self, _timeout: Duration) -> Result<Fetched, SourceError> {
            Err(SourceError::Transport {
                source: self.info.name,
                detail: "unreachable".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{FailingSource, MockSource};
    use super::*;

    #[test]
    fn gather_combines_all_sources() {
        let sources: Vec<Box<dyn EntropySource>> = vec![
            Box::new(MockSource::new("a", vec![1, 2, 3])),
            Box::new(MockSource::new("b", vec![4, 5, 6])),
        ];
        let digest = gather(&sources, Duration::from_millis(100));
        assert_ne!(digest, [0u8; 32]);
    }

    #[test]
    fn gather_tolerates_total_failure() {
        let sources: Vec<Box<dyn EntropySource>> = vec![
            Box::new(FailingSource::new("x")),
            Box::new(FailingSource::new("y")),
        ];
        let digest = gather(&sources, Duration::from_millis(100));
        // Timestamp mixing means even all-fallback input yields a live digest.
        assert_ne!(digest, [0u8; 32]);
    }

    #[test]
    fn gather_with_no_sources_still_produces_digest() {
        let sources: Vec<Box<dyn EntropySource>> = Vec::new();
        let digest = gather(&sources, Duration::from_millis(100));
        assert_ne!(digest, [0u8; 32]);
    }

    #[test]
    fn oversized_payload_is_capped() {
        let big = vec![0xAB; MAX_SOURCE_BYTES * 4];
        let sources: Vec<Box<dyn EntropySource>> =
            vec![Box::new(MockSource::new("big", big))];
        // Must terminate quickly and produce a digest; the cap bounds the
        // bytes folded into the hash.
        let digest = gather(&sources, Duration::from_millis(100));
        assert_ne!(digest, [0u8; 32]);
    }

    #[test]
    fn source_kind_display() {
        assert_eq!(SourceKind::Weather.to_string(), "weather");
        assert_eq!(SourceKind::NetworkTiming.to_string(), "network_timing");
    }
}
