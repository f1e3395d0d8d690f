// Copyright (c) 2024 Botho Foundation

//! GFOX token simulator.
//!
//! Replays trading scenarios against the token on an in-memory exchange and
//! prints fee quotes.

mod report;
mod runner;
mod scenario;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gfox_token::{Direction, FeeSchedule, TokenConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{runner::Simulation, scenario::Scenario};

#[derive(Parser)]
#[command(name = "gfox-sim")]
#[command(about = "Simulate GFOX transfers, taxes and liquidity conversion")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Direction::Buy,
            Side::Sell => Direction::Sell,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Replay a scenario file
    Run {
        /// Scenario to replay
        #[arg(short, long)]
        scenario: PathBuf,

        /// Token configuration (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Exit with an error if any step is rejected
        #[arg(long)]
        strict: bool,
    },

    /// Show the fee taken from a trade
    Quote {
        /// Trade direction
        #[arg(short, long, value_enum, default_value = "sell")]
        direction: Side,

        /// Trade size in whole tokens
        #[arg(short, long, default_value = "1000")]
        amount: u64,

        /// Token configuration (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default token configuration
    DefaultConfig,
}

fn load_config(path: Option<&Path>) -> Result<TokenConfig> {
    match path {
        Some(path) => TokenConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(TokenConfig::default()),
    }
}

fn run(scenario_path: &Path, config_path: Option<&Path>, strict: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let scenario = Scenario::from_file(scenario_path)
        .with_context(|| format!("failed to load scenario from {}", scenario_path.display()))?;

    info!(
        token = %config.symbol,
        steps = scenario.steps.len(),
        "replaying scenario"
    );
    let mut sim = Simulation::new(config, &scenario)?;
    let results = sim.run(&scenario.steps);

    let decimals = sim.token().decimals();
    report::print_steps(&scenario.steps, &results, decimals);
    report::print_summary(&sim);

    let rejected = results.iter().filter(|r| r.is_rejected()).count();
    if strict && rejected > 0 {
        bail!("{rejected} step(s) rejected");
    }
    Ok(())
}

fn quote(side: Side, amount: u64, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut fees = FeeSchedule::new(config.buy_tax, config.sell_tax)?;
    fees.set_enabled(true)?;

    let direction = Direction::from(side);
    let amount = config.to_base_units(amount)?;
    let quote = fees.quote(direction, amount, false)?;
    let rate = fees
        .rate_for(direction)
        .context("direction has no tax rate")?;

    report::print_quote(direction, rate, quote, amount, config.decimals);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Command::Run {
            scenario,
            config,
            strict,
        } => run(&scenario, config.as_deref(), strict),
        Command::Quote {
            direction,
            amount,
            config,
        } => quote(direction, amount, config.as_deref()),
        Command::DefaultConfig => {
            let config = TokenConfig::default();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
