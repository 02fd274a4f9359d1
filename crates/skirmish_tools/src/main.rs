//! Skirmish - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "skirmish-tools")]
#[command(about = "Development tools for Skirmish")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate encounter files
    Validate {
        /// Path to encounter directory
        #[arg(default_value = "assets/encounters")]
        path: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating encounter files in: {path}");
            let dir = std::path::Path::new(&path);
            match skirmish_tools::validate::validate_encounter_directory(dir) {
                Ok(report) if report.is_clean() => {
                    tracing::info!(files = report.checked.len(), "Validation passed");
                }
                Ok(report) => {
                    for failure in &report.failures {
                        tracing::error!("{failure}");
                    }
                    tracing::error!(
                        failed = report.failures.len(),
                        passed = report.checked.len(),
                        "Validation failed"
                    );
                    std::process::exit(1);
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
