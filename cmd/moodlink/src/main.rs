//! MoodLink CLI - runs the emotion pipeline over recorded PCM16 audio.

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{BasisCommand, ClassifyCommand, FeaturesCommand};

/// MoodLink CLI - speech emotion recognition from 4 s PCM16 recordings.
///
/// Input is raw little-endian 16-bit mono audio at 44.1 kHz ("-" reads
/// stdin). Shorter recordings are zero-padded.
#[derive(Parser)]
#[command(name = "moodlink")]
#[command(about = "MoodLink audio feature and emotion classification tool")]
#[command(version)]
pub struct Cli {
    /// Pipeline config file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Condition a recording and extract its MFCC features
    Features(FeaturesCommand),
    /// Run a full capture-to-classification cycle
    Classify(ClassifyCommand),
    /// Show the spectral basis geometry
    Basis(BasisCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; -v raises the default.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    debug!(version = env!("CARGO_PKG_VERSION"), "moodlink: starting");

    match &cli.command {
        Commands::Features(cmd) => cmd.run(&cli),
        Commands::Classify(cmd) => cmd.run(&cli),
        Commands::Basis(cmd) => cmd.run(&cli),
    }
}
