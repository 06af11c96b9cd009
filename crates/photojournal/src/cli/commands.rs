//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and the words
//! understood by an interactive session.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::app::Command as AppCommand;

/// Feed command arguments.
#[derive(Debug, Args)]
pub struct FeedCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Capture command arguments.
#[derive(Debug, Args)]
pub struct CaptureCommand {
    /// Image file standing in for the camera
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    /// Show the preview but do not save it
    #[arg(long)]
    pub discard: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the photo to delete
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Session command arguments.
#[derive(Debug, Args)]
pub struct SessionCommand {
    /// Image file standing in for the camera
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// One line of session input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Forward to the controller.
    App(AppCommand),
    /// End the session.
    Quit,
    /// Blank line.
    Empty,
}

/// Parse one line typed into a session.
///
/// # Errors
///
/// Returns a message naming the problem for unknown words or a `delete`
/// without an id.
pub fn parse_session_line(line: &str) -> Result<SessionInput, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(SessionInput::Empty);
    };

    let command = match word {
        "open" => AppCommand::OpenCamera,
        "retry" => AppCommand::RetryCamera,
        "capture" => AppCommand::Capture,
        "retake" => AppCommand::Retake,
        "save" => AppCommand::Save,
        "close" => AppCommand::CloseCamera,
        "install" => AppCommand::Install,
        "dismiss" => AppCommand::DismissInstall,
        "delete" => match words.next() {
            Some(id) => AppCommand::Delete(id.to_string()),
            None => return Err("usage: delete <id>".to_string()),
        },
        "quit" | "exit" => return Ok(SessionInput::Quit),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(SessionInput::App(command))
}
