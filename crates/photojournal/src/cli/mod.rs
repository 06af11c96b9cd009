//! Command-line interface for photojournal.
//!
//! This module provides the CLI structure for the `photojournal` binary and
//! the parser for interactive session input.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_session_line, CaptureCommand, ConfigCommand, DeleteCommand, FeedCommand,
    SessionCommand, SessionInput, StatusCommand,
};

/// photojournal - Capture moments, keep a quote with each one
///
/// Takes a still from a camera, pairs it with an inspirational quote and
/// keeps it in a local journal.
#[derive(Debug, Parser)]
#[command(name = "photojournal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the journal feed
    Feed(FeedCommand),

    /// Take a photo from an image file and save it with a quote
    Capture(CaptureCommand),

    /// Delete a photo
    Delete(DeleteCommand),

    /// Drive the journal interactively from stdin
    Session(SessionCommand),

    /// Show storage status
    Status(StatusCommand),

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
