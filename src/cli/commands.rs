//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: start the worker pool and generate traffic
//! - preview: show the derived quota schedule without running

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trafficr - A quota-driven traffic generation engine
#[derive(Parser, Debug)]
#[command(name = "trafficr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engine and generate traffic until stopped
    Run {
        /// Number of concurrent workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Stop automatically after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Show the derived quota targets and hourly schedule, then exit
    Preview,
}
