//! Binary entry point that parses flags, bootstraps logging and the
//! environment, and launches the voice command loop on stdin.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use voice_commander::assistant::{self, RunOptions};

#[derive(Parser)]
#[command(name = "voice-commander")]
#[command(about = "Keyword-driven voice assistant", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./config.json when present)
    #[arg(long, env = "VOICE_COMMANDER_CONFIG")]
    config: Option<PathBuf>,

    /// Handle a single utterance and exit
    #[arg(long)]
    once: bool,

    /// Print replies without speaking them
    #[arg(long)]
    mute: bool,

    /// Seed for reply selection, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Write the interaction log to this file on exit
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Bootstraps environment variables and tracing, then runs the assistant.
fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    assistant::run_voice_assistant(RunOptions {
        config_path: args.config,
        once: args.once,
        mute: args.mute,
        seed: args.seed,
        log_file: args.log_file,
    })
}
