//! Frontline - turn driver
//!
//! Loads a scenario (or generates a seeded grid), steps it for a number of
//! turns and writes the per-turn reports as JSON.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use frontline::core::config::DerivationConfig;
use frontline::core::error::Result;
use frontline::scenario::{generate_grid_scenario, GridScenarioConfig, Scenario};
use frontline::turn::advance_turn;

/// Run the front/supply/corps derivation suite over a scenario
#[derive(Parser, Debug)]
#[command(name = "frontline")]
#[command(about = "Step a settlement-graph scenario and report per-turn derivations")]
struct Args {
    /// Scenario JSON file; a grid is generated when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Generated grid width
    #[arg(long, default_value_t = 80)]
    width: u32,

    /// Generated grid height
    #[arg(long, default_value_t = 75)]
    height: u32,

    /// Number of factions on the generated grid
    #[arg(long, default_value_t = 3)]
    factions: u32,

    /// Seed for the generated grid
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Turns to run
    #[arg(long, default_value_t = 1)]
    turns: u32,

    /// Derivation config (TOML); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write reports here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frontline=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DerivationConfig::load(path)?,
        None => DerivationConfig::default(),
    };

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => generate_grid_scenario(&GridScenarioConfig {
            width: args.width,
            height: args.height,
            factions: args.factions,
            seed: args.seed,
            ..GridScenarioConfig::default()
        }),
    };
    let graph = scenario.graph()?;
    tracing::info!(
        settlements = graph.settlement_count(),
        edges = graph.edge_count(),
        "scenario loaded"
    );

    let mut state = scenario.state;
    let mut reports = Vec::with_capacity(args.turns as usize);
    for _ in 0..args.turns {
        reports.push(advance_turn(&mut state, &graph, &config)?);
    }

    let json = serde_json::to_string_pretty(&reports)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), turns = reports.len(), "reports written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
