//! # rngbench-core
//!
//! Comparative benchmarking for pseudo-random byte generators.
//!
//! The library drives several generator implementations — the platform's
//! cryptographically secure source, an insecure fast baseline, and a set of
//! "exotic" generators whose seed material comes from external network calls
//! (weather data, market data, TCP handshake timing) — and produces
//! statistical quality and throughput measurements for each.
//!
//! ## Quick start
//!
//! ```no_run
//! use rngbench_core::bench::{self, BenchConfig};
//! use rngbench_core::generator;
//!
//! let generators = generator::baseline_registry();
//! let report = bench::run(&generators, &BenchConfig::default());
//! for agg in &report.aggregates {
//!     println!("{}: {:.1} MB/s, H={:.3}", agg.generator,
//!         agg.avg_throughput_bps / 1e6, agg.avg_shannon_entropy);
//! }
//! ```
//!
//! ## Architecture
//!
//! Sources → KeyedStream (HMAC-SHA256 counter mode, periodic reseed)
//! → ByteGenerator registry → BenchmarkOrchestrator → Analysis/Aggregates
//!
//! None of the network-seeded generators is a reviewed RNG design; several
//! are deliberately weak. The point is the measurement harness, not the
//! generators.

pub mod analysis;
pub mod bench;
pub mod error;
pub mod generator;
pub mod source;
pub mod sources;
pub mod stream;

pub use analysis::{Analysis, analyze};
pub use bench::{AggregatedResult, BenchConfig, BenchReport, TestResult};
pub use error::{GenerateError, SourceError};
pub use generator::{ByteGenerator, InsecureFast, KeyedGenerator, SecureSystem};
pub use source::{EntropySource, Fetched, SourceInfo, SourceKind};
pub use stream::{KeyedStream, ReseedPolicy, SeedKeying};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
