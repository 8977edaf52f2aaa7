//! Spin Royale headless runner
//!
//! Runs a whole tournament without presentation and prints the standings.
//!
//! Usage:
//!   spin-royale Alice Bob Carol Dave --seed 42
//!   spin-royale --entrants-file names.txt --config tournament.toml --out standings.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use spin_royale::sim::BattleEvent;
use spin_royale::{BattleSpeed, TournamentConfig, TournamentError, TournamentPhase, start_tournament};

#[derive(Parser)]
#[command(name = "spin-royale")]
#[command(about = "Run a spinning-top elimination tournament headlessly")]
struct Args {
    /// Entrant labels (case-insensitive duplicates are dropped)
    entrants: Vec<String>,

    /// Read additional entrants from a file, one per line
    #[arg(long)]
    entrants_file: Option<PathBuf>,

    /// Tournament config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Battle speed preset (normal, double, quad, hyper)
    #[arg(long, value_parser = parse_speed)]
    speed: Option<BattleSpeed>,

    /// Write the standings JSON here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print heat results as they happen
    #[arg(short, long)]
    verbose: bool,
}

fn parse_speed(s: &str) -> Result<BattleSpeed, String> {
    BattleSpeed::from_str(s).ok_or_else(|| format!("unknown speed {s:?}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), TournamentError> {
    let mut config = match &args.config {
        Some(path) => TournamentConfig::load(path)?,
        None => TournamentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }

    let mut entrants = args.entrants.clone();
    if let Some(path) = &args.entrants_file {
        let text = std::fs::read_to_string(path)?;
        entrants.extend(text.lines().map(str::to_string));
    }

    let mut handle = start_tournament(&entrants, config)?;
    while handle.phase() != TournamentPhase::Complete {
        match handle.phase() {
            TournamentPhase::HeatTransition => handle.request_heat_advance()?,
            _ => {
                handle.advance_frame();
            }
        }
        let events = handle.drain_events();
        if args.verbose {
            report(events);
        }
    }

    let standings = handle.standings();
    log::info!(
        "Tournament finished after {} ticks and {} heats",
        handle.tick_count(),
        handle.heats().len()
    );
    match &args.out {
        Some(path) => standings.save(path)?,
        None => println!("{}", standings.to_json()?),
    }
    Ok(())
}

/// Print heat-level events and drop the rest
fn report(events: Vec<BattleEvent>) {
    for event in events {
        match event {
            BattleEvent::HeatStarted { heat, entrants, finals } => {
                let kind = if finals { "Finals" } else { "Heat" };
                println!("{kind} {heat}: {}", entrants.join(", "));
            }
            BattleEvent::HeatReset { heat, trigger } => {
                println!("  heat {heat} reset by {trigger}");
            }
            BattleEvent::HeatEnded { survivors, .. } => {
                println!("  advancing: {}", survivors.join(", "));
            }
            BattleEvent::PreliminaryDecided { group, members } => {
                println!("  {group} wins the preliminary ({} entrants)", members.len());
            }
            BattleEvent::TournamentEnded { winner } => {
                println!("Winner: {winner}");
            }
            _ => {}
        }
    }
}
