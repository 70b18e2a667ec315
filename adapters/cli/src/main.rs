#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Specter Defence.
//!
//! Runs a seeded simulation for a fixed number of ticks, optionally driven by
//! the built-in autopilot, and prints a JSON summary of the outcome.

mod autopilot;
mod progress;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use specter_defence_core::{Event, RunPhase, SimulationConfig};
use specter_defence_scheduler::Simulation;
use tracing_subscriber::EnvFilter;

use crate::{autopilot::Autopilot, progress::JsonLinesStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Specter Defence runner", long_about = None)]
struct Cli {
    /// JSON configuration file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of simulation steps to run.
    #[arg(long, default_value_t = 12_000)]
    ticks: u32,
    /// Length of one step in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Appends progress snapshots to this JSON-lines file.
    #[arg(long)]
    progress: Option<PathBuf>,
    /// Runs without the autopilot; no guardian is ever summoned.
    #[arg(long)]
    idle: bool,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    seed: u64,
    elapsed_ms: u64,
    ended: bool,
    stage: u32,
    currency: u32,
    corruption: f32,
    guardians: usize,
    kills: u32,
    escapes: u32,
    bosses: u32,
}

/// Entry point for the Specter Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let summary = run(&cli, config)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run(cli: &Cli, config: SimulationConfig) -> Result<RunSummary> {
    let autopilot = (!cli.idle).then(|| Autopilot::new(&config));
    let mut summary = RunSummary {
        seed: config.seed,
        ..RunSummary::default()
    };

    let mut simulation = Simulation::new(config);
    if let Some(path) = &cli.progress {
        simulation = simulation.with_progress_store(JsonLinesStore::open(path)?);
    }

    tracing::info!(
        target: "specter_defence::cli",
        seed = summary.seed,
        ticks = cli.ticks,
        tick_ms = cli.tick_ms,
        "run.start"
    );
    simulation.start();

    let dt = Duration::from_millis(cli.tick_ms);
    for _ in 0..cli.ticks {
        if let Some(autopilot) = &autopilot {
            autopilot.act(&mut simulation);
        }
        simulation.step(dt);

        for event in simulation.drain_events() {
            match event {
                Event::EnemyDied { .. } => summary.kills += 1,
                Event::EnemyEscaped { .. } => summary.escapes += 1,
                Event::BossSpawned { .. } => summary.bosses += 1,
                Event::StageAdvanced { stage } => {
                    tracing::info!(target: "specter_defence::cli", stage, "stage.advanced");
                }
                _ => {}
            }
        }

        if simulation.run_phase() == RunPhase::Ended {
            break;
        }
    }

    let ledger = simulation.ledger();
    summary.elapsed_ms = u64::try_from(simulation.now().as_millis()).unwrap_or(u64::MAX);
    summary.ended = simulation.run_phase() == RunPhase::Ended;
    summary.stage = simulation.stage().stage;
    summary.currency = ledger.currency;
    summary.corruption = ledger.corruption;
    summary.guardians = simulation.guardians().len();
    Ok(summary)
}
