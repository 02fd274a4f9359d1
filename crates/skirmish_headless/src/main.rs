//! Headless skirmish runner.
//!
//! This binary runs an encounter without graphics, controlled via JSON on
//! stdin/stdout. Designed for bots, CI testing, and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p skirmish_headless
//!
//! # Run an encounter file and record a replay
//! cargo run -p skirmish_headless -- run --scenario abc --record abc.replay
//!
//! # Verify determinism of a scripted encounter
//! cargo run -p skirmish_headless -- verify --scenario duel --runs 8
//!
//! # Verify a replay
//! cargo run -p skirmish_headless -- replay --file abc.replay --verify
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_core::replay::{Replay, ReplayPlayer};
use skirmish_headless::{
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
    verify::{load_script, scripted_frames, verify_determinism},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless turn-based skirmish runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive encounter
    Run {
        /// Encounter id or RON file to load
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,

        /// Record a replay to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Verify determinism by running the same script multiple times
    Verify {
        /// Encounter id or RON file to test
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Rounds of the built-in attack script
        #[arg(long, default_value = "3")]
        rounds: u32,

        /// Frame script (JSON lines of protocol commands) instead of the built-in one
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Replay a recorded encounter
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
            record,
        }) => cmd_run(&scenario, auto_state, record),
        Some(Commands::Verify {
            scenario,
            runs,
            rounds,
            script,
        }) => cmd_verify(&scenario, runs, rounds, script),
        Some(Commands::Replay { file, verify }) => cmd_replay(&file, verify),
        None => {
            // Default: interactive mode
            cmd_run("duel", false, None);
        }
    }
}

fn load_scenario(id: &str) -> Scenario {
    match Scenario::resolve(id) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario '{id}': {e}");
            std::process::exit(1);
        }
    }
}

/// Run a single interactive encounter
fn cmd_run(scenario: &str, auto_state: bool, record: Option<PathBuf>) {
    tracing::info!(scenario, "Starting interactive session");

    let scenario = load_scenario(scenario);
    let config = HeadlessConfig {
        auto_state_output: auto_state,
        record_path: record,
    };

    let runner = match HeadlessRunner::new(config, &scenario) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start encounter: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "Runner IO failed");
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, runs: u32, rounds: u32, script: Option<PathBuf>) {
    let scenario = load_scenario(scenario);

    let frames = match script {
        Some(path) => match load_script(&path) {
            Ok(frames) => frames,
            Err(e) => {
                eprintln!("Failed to load script: {e}");
                std::process::exit(1);
            }
        },
        None => scripted_frames(&scenario.encounter, rounds),
    };

    match verify_determinism(&scenario, &frames, runs) {
        Ok(report) if report.is_deterministic() => {
            eprintln!(
                "PASS: All {} runs produced identical results ({} ticks)",
                report.hashes.len(),
                report.ticks
            );
            if let Some(hash) = report.hashes.first() {
                eprintln!("  Hash: {hash:016x}");
            }
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            for (run, hash) in report.hashes.iter().enumerate() {
                eprintln!("  Run {run}: {hash:016x}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: Error during verification: {e}");
            std::process::exit(1);
        }
    }
}

/// Replay a recorded encounter
fn cmd_replay(file: &Path, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = match Replay::load(file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Encounter: {}", replay.encounter);
    eprintln!("  Start tick: {}", replay.start_tick);
    eprintln!("  Duration: {} ticks", replay.duration());

    let mut player = match ReplayPlayer::new(replay) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create replay player: {e}");
            std::process::exit(1);
        }
    };

    if verify {
        eprintln!("Verifying replay...");
        match player.verify() {
            Ok(()) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Hash: {:016x}", player.replay().final_hash);
            }
            Err(e) => {
                eprintln!("FAIL: {e}");
                std::process::exit(1);
            }
        }
    } else {
        // Play mode: print every tick's events as protocol lines
        while let Some(events) = player.advance() {
            if events.events.is_empty() {
                continue;
            }
            let response = skirmish_headless::Response::Events {
                tick: events.tick,
                events: events.events,
            };
            print!("{}", response.to_json_line());
        }

        let session = player.session();
        eprintln!("Replay complete at tick {}", session.get_tick());
        eprintln!("Final state hash: {:016x}", session.state_hash());
        eprintln!("Outcome: {:?}", session.outcome());
    }
}
