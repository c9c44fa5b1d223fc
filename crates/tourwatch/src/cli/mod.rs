//! Command-line interface for tourwatch.
//!
//! This module provides the CLI structure for the `tourwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ActionArg, ConfigCommand, LogsCommand, ScanCommand, ScanOptions, SessionCommand,
};

/// tourwatch - Tourist safety QR scanning for police officers
///
/// Scan a tourist's QR code from a camera feed or an image, review their
/// profile and live location, and mark them safe, flag them for
/// assistance, or download a report.
#[derive(Debug, Parser)]
#[command(name = "tourwatch")]
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
    /// Scan one tourist and optionally act on them
    #[command(subcommand)]
    Scan(ScanCommand),

    /// Run the interactive dashboard
    Session(SessionCommand),

    /// Show the recent access log
    Logs(LogsCommand),

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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Logs(LogsCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "tourwatch");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_file() {
        let args = vec!["tourwatch", "scan", "file", "qr.png", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Scan(ScanCommand::File { image, options }) => {
                assert_eq!(image, PathBuf::from("qr.png"));
                assert!(options.json);
                assert!(options.actions.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_payload_with_actions() {
        let args = vec![
            "tourwatch",
            "scan",
            "payload",
            r#"{"id":"T777"}"#,
            "--action",
            "flag-assistance",
            "-a",
            "download-report",
            "--instant",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Scan(ScanCommand::Payload { text, options }) => {
                assert_eq!(text, r#"{"id":"T777"}"#);
                assert_eq!(
                    options.actions,
                    vec![ActionArg::FlagAssistance, ActionArg::DownloadReport]
                );
                assert!(options.instant);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_camera_requires_frames() {
        let args = vec!["tourwatch", "scan", "camera"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = vec!["tourwatch", "scan", "camera", "--frames", "/tmp/feed"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Scan(ScanCommand::Camera { .. })
        ));
    }

    #[test]
    fn test_parse_session() {
        let args = vec!["tourwatch", "session", "--frames", "feed", "--instant"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Session(cmd) => {
                assert_eq!(cmd.frames, Some(PathBuf::from("feed")));
                assert!(cmd.instant);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_logs() {
        let args = vec!["tourwatch", "logs", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Logs(LogsCommand { json: true })));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["tourwatch", "-c", "/custom/config.toml", "logs"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["tourwatch", "-v", "logs"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["tourwatch", "-q", "config", "path"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
