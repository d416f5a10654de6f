//! `rngbench run` — drive the benchmark and print aggregates.

use std::time::Duration;

use rngbench_core::bench::{self, BenchConfig, BenchReport};
use rngbench_core::generator::{self, ByteGenerator};

#[allow(clippy::too_many_arguments)]
pub fn run(
    trials: usize,
    size: usize,
    concurrency: usize,
    retries: usize,
    timeout_ms: u64,
    filter: &str,
    offline: bool,
    output: Option<&str>,
) {
    let source_timeout = Duration::from_millis(timeout_ms);

    let mut generators: Vec<Box<dyn ByteGenerator>> = if offline {
        generator::baseline_registry()
    } else {
        println!("Initializing generators (network-seeded variants fetch entropy now)...");
        match generator::registry(source_timeout) {
            Ok(generators) => generators,
            Err(err) => {
                eprintln!("failed to initialize generators: {err}");
                std::process::exit(1);
            }
        }
    };

    if let Err(err) = apply_filter(&mut generators, filter) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let config = BenchConfig {
        trials,
        payload_bytes: size,
        concurrency,
        retries,
        ..BenchConfig::default()
    };

    println!(
        "\nRunning {} trials x {} generator(s), {} bytes/trial, K={}...\n",
        trials,
        generators.len(),
        size,
        concurrency
    );

    let report = bench::run(&generators, &config);
    print_report(&report);

    if let Some(path) = output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => println!("\nFull report written to {path}"),
                Err(err) => eprintln!("failed to write {path}: {err}"),
            },
            Err(err) => eprintln!("failed to serialize report: {err}"),
        }
    }
}

/// Restrict the set to the comma-separated generator names in `filter`.
/// Names must match exactly; `"all"` keeps everything. A name outside the
/// catalog, or one whose generator was not built in this mode, is an error.
fn apply_filter(
    generators: &mut Vec<Box<dyn ByteGenerator>>,
    filter: &str,
) -> Result<(), String> {
    if filter == "all" {
        return Ok(());
    }
    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();
    for w in &wanted {
        if !generator::variant_catalog().iter().any(|(name, _)| name == w) {
            return Err(format!("unknown generator '{w}' (see `rngbench list`)"));
        }
    }
    generators.retain(|g| wanted.iter().any(|w| g.name() == *w));
    if generators.is_empty() {
        return Err(format!(
            "filter '{filter}' selects no initialized generator (see `rngbench list`)"
        ));
    }
    Ok(())
}

fn print_report(report: &BenchReport) {
    println!("{}", "=".repeat(100));
    println!("BENCHMARK RESULTS");
    println!("{}", "=".repeat(100));
    println!(
        "{:<16} {:>5} {:>5} {:>10} {:>10} {:>9} {:>8} {:>10} {:>9}",
        "Generator", "OK", "Fail", "MB/s", "Chi²", "Shannon", "Mean", "Monobit", "Autocorr"
    );
    println!("{}", "-".repeat(100));

    for agg in &report.aggregates {
        println!(
            "{:<16} {:>5} {:>5} {:>10.2} {:>10.2} {:>9.4} {:>8.2} {:>9.1}% {:>9.4}",
            agg.generator,
            agg.successes,
            agg.failures,
            agg.avg_throughput_bps / 1e6,
            agg.avg_chi_square,
            agg.avg_shannon_entropy,
            agg.avg_mean,
            agg.monobit_pass_rate * 100.0,
            agg.avg_autocorr_lag1,
        );
    }

    println!("{}", "-".repeat(100));
    println!("Total wall-clock: {:.2}s", report.elapsed_secs);
    println!("\nNotes:");
    println!("* MB/s: higher is faster.");
    println!("* Chi²: uniformity over byte values; ~255 is ideal, extremes indicate bias.");
    println!("* Shannon: unpredictability in bits/byte; 8.0 is the maximum.");
    println!("* Mean: average byte value; 127.5 expected for uniform output.");
    println!("* Monobit: NIST frequency test pass rate (p >= 0.01); higher is better.");
    println!("* Autocorr: adjacent-byte equality rate; ~0.0039 (1/256) expected.");
}
