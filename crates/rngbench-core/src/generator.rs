//! Generator registry: the concrete byte-generator variants under test.
//!
//! Every variant exposes the same two-operation capability via
//! [`ByteGenerator`]: a name and `generate_bytes(n)`. The network-seeded
//! variants are all the same [`KeyedStream`] construction configured with a
//! different source set and seed keying; only the secure-system and
//! insecure-fast baselines bypass it.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::error::GenerateError;
use crate::source::EntropySource;
use crate::sources::{MarketSource, NetworkLatencySource, SystemRandomSource, WeatherSource};
use crate::stream::{KeyedStream, ReseedPolicy, SeedKeying};

/// Polymorphic byte-generator capability.
pub trait ByteGenerator: Send + Sync {
    /// Stable display name, used as the aggregation key.
    fn name(&self) -> &'static str;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Produce exactly `n` pseudo-random bytes.
    fn generate_bytes(&self, n: usize) -> Result<Vec<u8>, GenerateError>;
}

// Name/description pairs shared by the live constructors and the catalog so
// the two cannot drift apart.
const SECURE_SYSTEM_INFO: (&str, &str) = (
    "secure_system",
    "Platform cryptographically secure random source",
);
const INSECURE_FAST_INFO: (&str, &str) = (
    "insecure_fast",
    "Non-cryptographic PRNG seeded from wall-clock time (baseline only)",
);
const WEATHER_SINGLE_INFO: (&str, &str) = (
    "weather_single",
    "Keyed stream reseeded from one external feed (weather)",
);
const MULTI_SOURCE_INFO: (&str, &str) = (
    "multi_source",
    "Keyed stream reseeded from weather + market + network latency",
);
const HYBRID_INFO: (&str, &str) = (
    "hybrid",
    "Keyed stream reseeded from weather + platform secure random",
);

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

/// Platform CSPRNG passthrough. Stateless, trivially thread-safe.
pub struct SecureSystem;

impl ByteGenerator for SecureSystem {
    fn name(&self) -> &'static str {
        SECURE_SYSTEM_INFO.0
    }

    fn description(&self) -> &'static str {
        SECURE_SYSTEM_INFO.1
    }

    fn generate_bytes(&self, n: usize) -> Result<Vec<u8>, GenerateError> {
        let mut out = vec![0u8; n];
        getrandom::fill(&mut out).map_err(|e| GenerateError::OsRandom(e.to_string()))?;
        Ok(out)
    }
}

/// Non-cryptographic PRNG seeded once from wall-clock time.
///
/// Statistically weaker and fully predictable from its seed. Included only
/// as a quality/throughput baseline — never for security use.
pub struct InsecureFast {
    rng: Mutex<SmallRng>,
}

impl InsecureFast {
    pub fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(nanos)),
        }
    }
}

impl Default for InsecureFast {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteGenerator for InsecureFast {
    fn name(&self) -> &'static str {
        INSECURE_FAST_INFO.0
    }

    fn description(&self) -> &'static str {
        INSECURE_FAST_INFO.1
    }

    fn generate_bytes(&self, n: usize) -> Result<Vec<u8>, GenerateError> {
        let mut out = vec![0u8; n];
        self.rng.lock().expect("rng lock poisoned").fill_bytes(&mut out);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Keyed-stream variants
// ---------------------------------------------------------------------------

/// A named [`KeyedStream`] exposed through the generator capability.
pub struct KeyedGenerator {
    name: &'static str,
    description: &'static str,
    stream: KeyedStream,
}

impl KeyedGenerator {
    pub fn new(
        name: &'static str,
        description: &'static str,
        sources: Vec<Box<dyn EntropySource>>,
        keying: SeedKeying,
        source_timeout: Duration,
    ) -> Result<Self, GenerateError> {
        Ok(Self {
            name,
            description,
            stream: KeyedStream::new(sources, ReseedPolicy::default(), keying, source_timeout)?,
        })
    }
}

impl ByteGenerator for KeyedGenerator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn generate_bytes(&self, n: usize) -> Result<Vec<u8>, GenerateError> {
        self.stream.generate(n)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Build the full generator set.
///
/// Construction performs each variant's initial seed-gathering pass, so this
/// blocks for up to `source_timeout` while the network-seeded variants pull
/// their first entropy. Seed keying per variant: the external-source
/// variants chain on the prior seed; the hybrid keys with fresh OS
/// randomness as a defense against total external-feed compromise.
pub fn registry(source_timeout: Duration) -> Result<Vec<Box<dyn ByteGenerator>>, GenerateError> {
    let mut generators = baseline_registry();

    generators.push(Box::new(KeyedGenerator::new(
        WEATHER_SINGLE_INFO.0,
        WEATHER_SINGLE_INFO.1,
        vec![Box::new(WeatherSource::new())],
        SeedKeying::PriorSeed,
        source_timeout,
    )?));

    generators.push(Box::new(KeyedGenerator::new(
        MULTI_SOURCE_INFO.0,
        MULTI_SOURCE_INFO.1,
        vec![
            Box::new(WeatherSource::new()),
            Box::new(MarketSource::new()),
            Box::new(NetworkLatencySource::new()),
        ],
        SeedKeying::PriorSeed,
        source_timeout,
    )?));

    generators.push(Box::new(KeyedGenerator::new(
        HYBRID_INFO.0,
        HYBRID_INFO.1,
        vec![
            Box::new(WeatherSource::new()),
            Box::new(SystemRandomSource::new()),
        ],
        SeedKeying::SystemRandom,
        source_timeout,
    )?));

    Ok(generators)
}

/// Only the generators that never touch the network.
pub fn baseline_registry() -> Vec<Box<dyn ByteGenerator>> {
    vec![Box::new(SecureSystem), Box::new(InsecureFast::new())]
}

/// Name/description catalog of every variant, without constructing any of
/// them (construction of the network-seeded variants blocks on the initial
/// seed-gathering pass).
pub fn variant_catalog() -> &'static [(&'static str, &'static str)] {
    &[
        SECURE_SYSTEM_INFO,
        INSECURE_FAST_INFO,
        WEATHER_SINGLE_INFO,
        MULTI_SOURCE_INFO,
        HYBRID_INFO,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_support::MockSource;

    #[test]
    fn secure_system_exact_length() {
        let generator = SecureSystem;
        for n in [0usize, 1, 100, 4096] {
            assert_eq!(generator.generate_bytes(n).expect("os rng").len(), n);
        }
    }

    #[test]
    fn secure_system_output_varies() {
        let generator = SecureSystem;
        let a = generator.generate_bytes(64).expect("a");
        let b = generator.generate_bytes(64).expect("b");
        assert_ne!(a, b);
    }

    #[test]
    fn insecure_fast_exact_length() {
        let generator = InsecureFast::new();
        for n in [0usize, 1, 3, 4, 5, 1024] {
            assert_eq!(generator.generate_bytes(n).expect("prng").len(), n);
        }
    }

    #[test]
    fn keyed_generator_over_mock_source() {
        let generator = KeyedGenerator::new(
            "mock_stream",
            "test stream",
            vec![Box::new(MockSource::new("m", vec![9; 32]))],
            SeedKeying::PriorSeed,
            Duration::from_millis(50),
        )
        .expect("construct");
        assert_eq!(generator.name(), "mock_stream");
        assert_eq!(generator.generate_bytes(1000).expect("generate").len(), 1000);
    }

    #[test]
    fn catalog_matches_baseline_generators() {
        for generator in baseline_registry() {
            let entry = variant_catalog()
                .iter()
                .find(|(name, _)| *name == generator.name())
                .unwrap_or_else(|| panic!("{} missing from catalog", generator.name()));
            assert_eq!(entry.1, generator.description());
        }
    }

    #[test]
    fn baseline_registry_names_are_unique() {
        let generators = baseline_registry();
        assert_eq!(generators.len(), 2);
        assert_ne!(generators[0].name(), generators[1].name());
    }
}
