//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::actions::OperatorAction;

/// One-shot scan commands.
#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    /// Decode a QR code from an image file
    File {
        /// Image containing the QR code
        image: PathBuf,

        #[command(flatten)]
        options: ScanOptions,
    },

    /// Scan camera frames until a QR code is found
    Camera {
        /// Directory of frames (png/jpeg) standing in for the camera feed
        #[arg(long, value_name = "DIR")]
        frames: PathBuf,

        #[command(flatten)]
        options: ScanOptions,
    },

    /// Enter a scanned payload by hand
    Payload {
        /// The QR payload text (JSON or a plain identifier)
        text: String,

        #[command(flatten)]
        options: ScanOptions,
    },
}

impl ScanCommand {
    /// Options shared by every scan source.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        match self {
            Self::File { options, .. }
            | Self::Camera { options, .. }
            | Self::Payload { options, .. } => options,
        }
    }
}

/// Options shared by the scan commands.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanOptions {
    /// Operator action to run once the tourist is loaded (repeatable)
    #[arg(short, long = "action", value_enum, value_name = "ACTION")]
    pub actions: Vec<ActionArg>,

    /// Skip the simulated registry latency
    #[arg(long)]
    pub instant: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Interactive session arguments.
#[derive(Debug, Args)]
pub struct SessionCommand {
    /// Directory of frames used by the `start` command
    #[arg(long, value_name = "DIR")]
    pub frames: Option<PathBuf>,

    /// Skip the simulated registry latency
    #[arg(long)]
    pub instant: bool,
}

/// Access log arguments.
#[derive(Debug, Args)]
pub struct LogsCommand {
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

/// Operator action argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Mark the tourist as safe
    MarkSafe,
    /// Flag the tourist for assistance
    FlagAssistance,
    /// Download the tourist report
    DownloadReport,
}

impl From<ActionArg> for OperatorAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::MarkSafe => Self::MarkSafe,
            ActionArg::FlagAssistance => Self::FlagAssistance,
            ActionArg::DownloadReport => Self::DownloadReport,
        }
    }
}
