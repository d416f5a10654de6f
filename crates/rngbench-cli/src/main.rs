//! CLI for rngbench — benchmark secure, insecure, and network-seeded byte
//! generators.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rngbench")]
#[command(about = "Comparative benchmark for pseudo-random byte generators")]
#[command(version = rngbench_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark and print per-generator aggregates
    Run {
        /// Trials per generator
        #[arg(long, default_value = "100")]
        trials: usize,

        /// Bytes generated per trial
        #[arg(long, default_value = "262144")]
        size: usize,

        /// Maximum simultaneous generation calls
        #[arg(long, default_value = "10")]
        concurrency: usize,

        /// Retries per failed trial
        #[arg(long, default_value = "2")]
        retries: usize,

        /// Per-source fetch timeout in milliseconds
        #[arg(long, default_value = "2000")]
        timeout_ms: u64,

        /// Comma-separated exact generator names (see `rngbench list`), or "all"
        #[arg(long, default_value = "all")]
        generators: String,

        /// Skip generators that need network access
        #[arg(long)]
        offline: bool,

        /// Write the full report (every trial + aggregates) as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// List the available generator variants
    List,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trials,
            size,
            concurrency,
            retries,
            timeout_ms,
            generators,
            offline,
            output,
        } => commands::run::run(
            trials,
            size,
            concurrency,
            retries,
            timeout_ms,
            &generators,
            offline,
            output.as_deref(),
        ),
        Commands::List => commands::list::run(),
    }
}
