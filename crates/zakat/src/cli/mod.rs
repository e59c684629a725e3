//! Command-line interface for zakat.
//!
//! This module provides the CLI structure for the `zakatctl` binary. Running
//! it without a subcommand opens the interactive menu.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BackupCommand, ConfigCommand, ExportCommand, ListCommand, ListTarget, OutputFormat,
    StatusCommand,
};

/// zakatctl - Manage zakat donations and rice distributions
///
/// Records donations, keeps a rice price list, tracks rice handed out
/// against each donation, and exports reports and backups.
#[derive(Debug, Parser)]
#[command(name = "zakatctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (defaults to the interactive menu)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive record manager
    Menu,

    /// Create the database or bring its schema up to date
    Init,

    /// Show database location and record counts
    Status(StatusCommand),

    /// Write the spreadsheet report
    Export(ExportCommand),

    /// Write an SQL dump of every table
    Backup(BackupCommand),

    /// List records
    List(ListCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
