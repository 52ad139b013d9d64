//! core-latency CLI
//!
//! Measures inter-core communication latency across every CPU pair and
//! prints the matrix.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use core_latency::{output, preflight, LatencyMeter};

#[derive(Parser)]
#[command(name = "core-latency")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Measure pairwise inter-core communication latency", long_about = None)]
struct Cli {
    /// Number of CPUs to cover (defaults to every CPU the OS reports)
    #[arg(short, long)]
    cpus: Option<usize>,

    /// Timed round trips per CPU pair
    #[arg(short, long, default_value_t = 8)]
    round_trips: usize,

    /// Unrecorded warmup round trips per pair
    #[arg(short, long, default_value_t = 32)]
    warmup: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: Format,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the environment checks
    #[arg(long)]
    no_preflight: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Human-readable table with a summary
    Table,
    /// Semicolon-separated grid
    Csv,
    /// JSON report
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.no_preflight {
        for warning in preflight::system_check() {
            warn!("{}", warning.description());
        }
    }

    let mut meter = LatencyMeter::new()
        .round_trips(cli.round_trips)
        .warmup(cli.warmup);
    if let Some(cpus) = cli.cpus {
        meter = meter.cpus(cpus);
    }

    let matrix = match meter.run() {
        Ok(matrix) => matrix,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    let mut rendered = match cli.format {
        Format::Table => output::terminal::render(&matrix),
        Format::Csv => output::csv::to_csv(&matrix),
        Format::Json => match output::json::to_json_pretty(&matrix) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("Error: {err}");
                process::exit(1);
            }
        },
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match cli.output {
        Some(path) => {
            if let Err(err) = fs::write(&path, rendered) {
                eprintln!("Error: could not write {}: {err}", path.display());
                process::exit(1);
            }
        }
        None => print!("{rendered}"),
    }
}
