//! Poise CLI: command-line interface for engagement scoring.
//!
//! Usage:
//!   poise score <TRACK> [OPTIONS]   Score a recorded landmark track
//!   poise init <NAME> --duration D  Create a session plan
//!   poise validate <PLAN>           Validate a session plan
//!   poise info <TRACK>              Show landmark track information

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use poise_common::config::{config_file_path, AppConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "poise",
    about = "Posture and eye-contact scoring over recorded landmark tracks",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit structured JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a recorded landmark track
    Score {
        /// Path to the landmark track (JSONL)
        track: PathBuf,

        /// Session plan; defaults to uniform segments over the whole track
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Segment length when no plan is given (seconds)
        #[arg(long, default_value = "4.0")]
        segment_secs: f64,

        /// Posture scoring: band|hips|head
        #[arg(long)]
        posture: Option<String>,

        /// Eye contact scoring: gaze|centre
        #[arg(long)]
        eye_contact: Option<String>,

        /// Rating scale: graded|bucket|lenient
        #[arg(long)]
        rating: Option<String>,

        /// Report output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a session plan with uniform segments
    Init {
        /// Session name
        name: String,

        /// Video duration (seconds)
        #[arg(long)]
        duration: f64,

        /// Segment length (seconds)
        #[arg(long, default_value = "4.0")]
        segment_secs: f64,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Validate a session plan
    Validate {
        /// Path to the plan file
        path: PathBuf,
    },

    /// Show landmark track information
    Info {
        /// Path to the landmark track (JSONL)
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    // Flags win over the config file
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    poise_common::logging::init_logging(&config.logging);
    tracing::debug!(path = %config_file_path().display(), "Configuration loaded");

    match cli.command {
        Commands::Score {
            track,
            plan,
            segment_secs,
            posture,
            eye_contact,
            rating,
            output,
        } => {
            let overrides = commands::score::ScoringOverrides {
                posture,
                eye_contact,
                rating,
            };
            commands::score::run(&config, track, plan, segment_secs, overrides, output).await
        }
        Commands::Init {
            name,
            duration,
            segment_secs,
            output,
        } => commands::init::run(name, duration, segment_secs, output),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
    }
}
