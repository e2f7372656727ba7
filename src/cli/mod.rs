//! CLI module for trafficr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the engine
//! and previewing the derived schedule.

pub mod commands;

pub use commands::Cli;
