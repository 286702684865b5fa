#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the seizure first-aid drill headlessly.

mod runner;
mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use seizure_drill_system_coaching::format_clock;
use seizure_drill_world::WorldConfig;
use tracing::Level;

use crate::{runner::RunSummary, script::DrillScript};

#[derive(Debug, Parser)]
#[command(name = "seizure-drill", about = "Seizure first-aid training drill")]
struct Cli {
    /// TOML drill script; without one the built-in responder plays the drill.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the incident and waveform randomness.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds advanced per tick.
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,
    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the seizure drill command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let mut script = match &cli.config {
        Some(path) => DrillScript::load(path)?,
        None => DrillScript::automatic(),
    };
    if let Some(tick_ms) = cli.tick_ms {
        script.tick_ms = tick_ms;
        script
            .validate()
            .context("invalid --tick-ms for this drill script")?;
    }
    let seed = cli.seed.or(script.seed).unwrap_or_else(|| WorldConfig::default().seed);

    let summary = runner::run(&script, seed);
    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn print_summary(summary: &RunSummary) {
    for timed in &summary.cues {
        println!("[{}] {}", timed.at, timed.cue.message);
    }
    println!();
    match &summary.report {
        Some(report) => println!("{report}"),
        None => println!(
            "Drill incomplete after {} (seed {:#x}).",
            format_clock(summary.snapshot.clock),
            summary.seed
        ),
    }
}
