//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use heat_core::{Discipline, ResultOrder};

/// Multi-competitor heat stopwatch.
///
/// Times several competitors who start at different moments, each on an
/// independent pausable clock, under manual or fixed-gap automatic starts.
#[derive(Debug, Parser)]
#[command(name = "heat", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a timing session, reading commands from stdin.
    Run(RunArgs),

    /// Validate a roster file and print the start list.
    Check {
        /// Roster file: one competitor name per line.
        roster: PathBuf,
    },
}

/// Options for a timing session. Flags override the config file.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Roster file: one competitor name per line, in start order.
    #[arg(short, long)]
    pub roster: PathBuf,

    /// Start discipline (manual or automatic).
    #[arg(short, long)]
    pub discipline: Option<Discipline>,

    /// Seconds between automatic starts.
    #[arg(short, long)]
    pub gap: Option<u32>,

    /// Result ordering (start or time).
    #[arg(short, long)]
    pub order: Option<ResultOrder>,

    /// Print final results as JSON.
    #[arg(long)]
    pub json: bool,
}
