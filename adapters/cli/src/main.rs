#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Stronghold rounds headlessly.

mod session;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use stronghold_system_campaign::{Campaign, Config as CampaignConfig};
use stronghold_world::World;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use crate::{
    session::{LevelSource, Session},
    settings::{load_level, Settings},
};

/// Plays Stronghold rounds with a bot on every side and prints a summary per round.
#[derive(Debug, Parser)]
#[command(name = "stronghold", version, about)]
struct CliArgs {
    /// Round to start the campaign at.
    #[arg(long)]
    round: Option<u32>,
    /// Number of rounds to play.
    #[arg(long)]
    rounds: Option<u32>,
    /// Seed shared by the world and the bots.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds after which an undecided round is abandoned.
    #[arg(long)]
    max_seconds: Option<f32>,
    /// TOML settings file with [simulation], [bot] and [run] tables.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// JSON or TOML level file played instead of the built-in campaign.
    #[arg(long, value_name = "FILE")]
    level: Option<PathBuf>,
    /// Increases log verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the Stronghold command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let settings = resolve_settings(&args)?;
    let levels = match &args.level {
        Some(path) => LevelSource::Fixed(
            load_level(path).with_context(|| format!("could not load level {}", path.display()))?,
        ),
        None => LevelSource::Campaign(Campaign::new(CampaignConfig::new(
            settings.run.first_round,
            settings.run.max_rounds,
            settings.run.arena,
        ))),
    };

    let time_limit = Duration::try_from_secs_f32(settings.run.max_seconds.max(0.0))
        .context("--max-seconds is out of range")?;
    let mut session = Session::new(
        World::with_config(settings.simulation.clone()),
        settings.bot,
        levels,
        settings.run.tick_hz,
        time_limit,
    );

    info!(rounds = settings.run.rounds, "starting headless session");
    for _ in 0..settings.run.rounds {
        let report = session.play_round();
        println!("{report}");
    }
    Ok(())
}

fn resolve_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("could not load settings {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(round) = args.round {
        settings.run.first_round = round;
    }
    if let Some(rounds) = args.rounds {
        settings.run.rounds = rounds;
    }
    if let Some(max_seconds) = args.max_seconds {
        settings.run.max_seconds = max_seconds;
    }
    if let Some(seed) = args.seed {
        settings.simulation.rng_seed = seed;
        settings.bot.rng_seed = seed;
    }

    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
