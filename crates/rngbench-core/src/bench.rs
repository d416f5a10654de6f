//! Benchmark orchestration: concurrency-bounded trials, retries, progress,
//! and aggregation.
//!
//! The orchestrator runs `generators × trials` independent trials. Every
//! trial gets its own scoped worker thread, launched eagerly but gated by a
//! counting admission gate so at most `concurrency` generation calls run
//! simultaneously. Workers stream [`TestResult`]s over one channel to a
//! single collector; a progress thread logs completed/total snapshots on a
//! timer. Transient generation failures are retried with linearly increasing
//! backoff, then recorded — one misbehaving generator degrades only its own
//! statistics, never the run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::analysis::{self, Analysis};
use crate::generator::ByteGenerator;

/// Floor for measured trial durations, so throughput never divides by zero.
const MIN_MEASURABLE: Duration = Duration::from_micros(1);

/// Tunables consumed by the orchestrator. All plain numbers/durations.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Trials per generator.
    pub trials: usize,
    /// Bytes requested per trial.
    pub payload_bytes: usize,
    /// Maximum simultaneous generation calls (the admission gate size).
    pub concurrency: usize,
    /// Retries after a failed generation call.
    pub retries: usize,
    /// Backoff before retry attempt `k` is `backoff_base * k`.
    pub backoff_base: Duration,
    /// How often the progress thread logs a completed/total snapshot.
    pub progress_interval: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            payload_bytes: 256 * 1024,
            concurrency: 10,
            retries: 2,
            backoff_base: Duration::from_millis(100),
            progress_interval: Duration::from_secs(5),
        }
    }
}

/// Immutable record of one trial.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Generator name (the aggregation key).
    pub generator: String,
    /// Trial index within this generator's batch.
    pub trial: usize,
    /// Wall-clock generation time in seconds (1µs floor).
    pub duration_secs: f64,
    /// Bytes per second; 0 for failed trials.
    pub throughput_bps: f64,
    /// Statistical snapshot of the output; `None` for failed trials.
    pub analysis: Option<Analysis>,
    /// Post-retry failure message, if the trial failed.
    pub error: Option<String>,
}

/// Aggregate view over one generator's completed trials. Derived and
/// recomputable; the list of [`TestResult`]s stays the source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResult {
    pub generator: String,
    pub trials: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_rate: f64,
    pub total_bytes: u64,
    pub min_duration_secs: f64,
    pub avg_duration_secs: f64,
    pub max_duration_secs: f64,
    pub min_throughput_bps: f64,
    pub avg_throughput_bps: f64,
    pub max_throughput_bps: f64,
    pub avg_mean: f64,
    pub avg_chi_square: f64,
    pub avg_shannon_entropy: f64,
    pub avg_monobit_p: f64,
    pub monobit_pass_rate: f64,
    pub avg_autocorr_lag1: f64,
    pub avg_freq_range: f64,
}

/// Everything a run produces. Serialization to files is the caller's job.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub trials_per_generator: usize,
    pub payload_bytes: usize,
    pub concurrency: usize,
    pub elapsed_secs: f64,
    pub results: Vec<TestResult>,
    pub aggregates: Vec<AggregatedResult>,
}

// ---------------------------------------------------------------------------
// Admission gate
// ---------------------------------------------------------------------------

/// Counting semaphore: at most `permits` holders at a time, excess callers
/// block until a slot frees.
struct AdmissionGate {
    permits: Mutex<usize>,
    available: Condvar,
}

impl AdmissionGate {
    fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits.max(1)),
            available: Condvar::new(),
        }
    }

    fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits.lock().expect("gate lock poisoned");
        while *permits == 0 {
            permits = self.available.wait(permits).expect("gate lock poisoned");
        }
        *permits -= 1;
        Permit { gate: self }
    }
}

struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut permits = self.gate.permits.lock().expect("gate lock poisoned");
        *permits += 1;
        self.gate.available.notify_one();
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Run the full benchmark over the given generators.
///
/// Trial completion order is unordered relative to submission; aggregation
/// groups by name and is order-independent.
pub fn run(generators: &[Box<dyn ByteGenerator>], config: &BenchConfig) -> BenchReport {
    let total = generators.len() * config.trials;
    let completed = AtomicUsize::new(0);
    let finished = (Mutex::new(false), Condvar::new());
    let started = Instant::now();
    let gate = AdmissionGate::new(config.concurrency);
    let (tx, rx) = mpsc::channel::<TestResult>();

    log::info!(
        "starting benchmark: {} generator(s) x {} trial(s), {} bytes/trial, K={}",
        generators.len(),
        config.trials,
        config.payload_bytes,
        config.concurrency
    );

    let mut results: Vec<TestResult> = Vec::with_capacity(total);

    std::thread::scope(|s| {
        // Progress snapshots on a timer, until the collector flips `finished`.
        s.spawn(|| {
            let (lock, cv) = &finished;
            let mut done = lock.lock().expect("progress lock poisoned");
            while !*done {
                let (guard, _timeout) = cv
                    .wait_timeout(done, config.progress_interval)
                    .expect("progress lock poisoned");
                done = guard;
                if !*done {
                    log::info!(
                        "progress: {}/{} trials complete",
                        completed.load(Ordering::Relaxed),
                        total
                    );
                }
            }
        });

        // One worker per (generator, trial), gated by the admission gate.
        for generator in generators {
            for trial in 0..config.trials {
                let tx = tx.clone();
                let gate = &gate;
                let completed = &completed;
                s.spawn(move || {
                    let result = {
                        let _permit = gate.acquire();
                        run_trial(generator.as_ref(), trial, config)
                    };
                    completed.fetch_add(1, Ordering::Relaxed);
                    // Receiver outlives all workers inside this scope.
                    let _ = tx.send(result);
                });
            }
        }
        drop(tx);

        // Single collector: drain until every worker has reported.
        for result in rx {
            results.push(result);
        }

        let (lock, cv) = &finished;
        *lock.lock().expect("progress lock poisoned") = true;
        cv.notify_all();
    });

    let aggregates = aggregate(&results);
    let elapsed_secs = started.elapsed().as_secs_f64();
    log::info!("benchmark finished: {total} trials in {elapsed_secs:.2}s");

    BenchReport {
        trials_per_generator: config.trials,
        payload_bytes: config.payload_bytes,
        concurrency: config.concurrency,
        elapsed_secs,
        results,
        aggregates,
    }
}

/// One trial: generate, time, analyze. Retries with linear backoff; a trial
/// that still fails is recorded, not propagated.
fn run_trial(generator: &dyn ByteGenerator, trial: usize, config: &BenchConfig) -> TestResult {
    let mut last_error = String::new();

    for attempt in 0..=config.retries {
        if attempt > 0 {
            std::thread::sleep(config.backoff_base * attempt as u32);
        }

        let start = Instant::now();
        match generator.generate_bytes(config.payload_bytes) {
            Ok(data) => {
                let duration = start.elapsed().max(MIN_MEASURABLE);
                let duration_secs = duration.as_secs_f64();
                return TestResult {
                    generator: generator.name().to_string(),
                    trial,
                    duration_secs,
                    throughput_bps: data.len() as f64 / duration_secs,
                    analysis: Some(analysis::analyze(&data)),
                    error: None,
                };
            }
            Err(err) => {
                log::warn!(
                    "{} trial {trial} attempt {attempt} failed: {err}",
                    generator.name()
                );
                last_error = err.to_string();
            }
        }
    }

    TestResult {
        generator: generator.name().to_string(),
        trial,
        duration_secs: 0.0,
        throughput_bps: 0.0,
        analysis: None,
        error: Some(last_error),
    }
}

/// Group results by generator name and fold each group into one
/// [`AggregatedResult`]. Min/avg/max and the averaged analysis fields cover
/// successful trials only; a generator with zero successes still appears,
/// with zeroed statistics.
pub fn aggregate(results: &[TestResult]) -> Vec<AggregatedResult> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<&str, Vec<&TestResult>> = BTreeMap::new();
    for result in results {
        groups.entry(&result.generator).or_default().push(result);
    }

    groups
        .into_iter()
        .map(|(name, group)| {
            let successes: Vec<&TestResult> = group
                .iter()
                .filter(|r| r.error.is_none())
                .copied()
                .collect();
            let n = successes.len();
            let nf = n as f64;

            let fold = |f: &dyn Fn(&TestResult) -> f64| -> (f64, f64, f64) {
                if n == 0 {
                    return (0.0, 0.0, 0.0);
                }
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut sum = 0.0;
                for &r in &successes {
                    let v = f(r);
                    min = min.min(v);
                    max = max.max(v);
                    sum += v;
                }
                (min, sum / nf, max)
            };

            let avg_of = |f: &dyn Fn(&Analysis) -> f64| -> f64 {
                if n == 0 {
                    return 0.0;
                }
                successes
                    .iter()
                    .filter_map(|r| r.analysis.as_ref())
                    .map(f)
                    .sum::<f64>()
                    / nf
            };

            let (min_d, avg_d, max_d) = fold(&|r| r.duration_secs);
            let (min_t, avg_t, max_t) = fold(&|r| r.throughput_bps);

            let monobit_passes = successes
                .iter()
                .filter_map(|r| r.analysis.as_ref())
                .filter(|a| a.monobit_pass)
                .count();

            let total_bytes: u64 = successes
                .iter()
                .filter_map(|r| r.analysis.as_ref())
                .map(|a| a.length as u64)
                .sum();

            AggregatedResult {
                generator: name.to_string(),
                trials: group.len(),
                successes: n,
                failures: group.len() - n,
                success_rate: if group.is_empty() {
                    0.0
                } else {
                    n as f64 / group.len() as f64
                },
                total_bytes,
                min_duration_secs: min_d,
                avg_duration_secs: avg_d,
                max_duration_secs: max_d,
                min_throughput_bps: min_t,
                avg_throughput_bps: avg_t,
                max_throughput_bps: max_t,
                avg_mean: avg_of(&|a| a.mean),
                avg_chi_square: avg_of(&|a| a.chi_square),
                avg_shannon_entropy: avg_of(&|a| a.shannon_entropy),
                avg_monobit_p: avg_of(&|a| a.monobit_p),
                monobit_pass_rate: if n == 0 { 0.0 } else { monobit_passes as f64 / nf },
                avg_autocorr_lag1: avg_of(&|a| a.autocorr_lag1),
                avg_freq_range: avg_of(&|a| a.freq_range as f64),
            }
        })
        .collect()
}
