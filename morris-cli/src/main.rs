//! Morris CLI - Command-line interface
//!
//! Commands:
//! - play: Play against the computer in the terminal
//! - match: Pit two computer players against each other

mod match_cmd;
mod play_cmd;
mod view;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "morris")]
#[command(about = "Nine Men's Morris with a NegaMax opponent")]
struct Cli {
    /// Log search and engine details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Seed for reproducible computer play
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game against the computer
    Play(play_cmd::PlayArgs),
    /// Run a computer-vs-computer match
    Match(match_cmd::MatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
    }
}

/// Logs go to stderr; stdout carries the board
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
