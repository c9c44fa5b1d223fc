//! `tourwatch` - CLI for the tourist safety dashboard
//!
//! This binary scans tourist QR codes, shows the resulting profile, and runs
//! operator actions, either one-shot or in an interactive session.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

use tourwatch::acquisition::DirectoryFrames;
use tourwatch::cli::{Cli, Command, ConfigCommand, LogsCommand, ScanCommand, SessionCommand};
use tourwatch::config::LatencyConfig;
use tourwatch::presentation::{access_log_lines, render_dashboard};
use tourwatch::profile::mock_access_logs;
use tourwatch::{
    init_logging, Config, Console, Notification, OperatorAction, Session, SimulatedGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Scan(scan_cmd) => handle_scan(&config, scan_cmd).await,
        Command::Session(session_cmd) => handle_session(&config, session_cmd).await,
        Command::Logs(logs_cmd) => handle_logs(&logs_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn gateway(config: &Config, instant: bool) -> SimulatedGateway {
    if instant {
        SimulatedGateway::new(LatencyConfig::zero())
    } else {
        SimulatedGateway::new(config.latency.clone())
    }
}

async fn handle_scan(config: &Config, cmd: ScanCommand) -> anyhow::Result<()> {
    let options = cmd.options().clone();
    let mut session =
        Session::new(gateway(config, options.instant)).with_report_dir(config.report_dir());

    let loaded = match cmd {
        ScanCommand::File { image, .. } => session.scan_file(image).await?.is_some(),
        ScanCommand::Camera { frames, .. } => {
            let mut events = session.start_camera(DirectoryFrames::new(frames), &config.camera)?;
            match events.recv().await {
                Some(event) => session.handle_event(event).await.is_some(),
                None => false,
            }
        }
        ScanCommand::Payload { text, .. } => session.submit_scan(&text).await.is_some(),
    };

    if !loaded {
        let message = session
            .dashboard()
            .error()
            .unwrap_or("No QR code could be read");
        bail!("{message}");
    }

    let mut notifications: Vec<Notification> = Vec::new();
    for action in options.actions {
        let action: OperatorAction = action.into();
        match session.perform(action).await {
            Ok(notification) => notifications.push(notification),
            Err(err) => eprintln!("Skipped {action}: {err}"),
        }
    }

    if options.json {
        let output = json!({
            "status": session.dashboard().status(),
            "tourist": session.dashboard().record(),
            "notifications": notifications
                .iter()
                .map(|n| json!({
                    "title": n.title,
                    "description": n.description,
                    "error": n.is_error(),
                }))
                .collect::<Vec<_>>(),
            "report": session.last_report(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}",
            render_dashboard(session.dashboard(), session.panel(), &config.officer)
        );
        for notification in &notifications {
            println!("{notification}");
        }
        if let Some(path) = session.last_report() {
            println!("Report: {}", path.display());
        }
    }

    if notifications.iter().any(Notification::is_error) {
        bail!("one or more actions failed");
    }
    Ok(())
}

async fn handle_session(config: &Config, cmd: SessionCommand) -> anyhow::Result<()> {
    let session =
        Session::new(gateway(config, cmd.instant)).with_report_dir(config.report_dir());
    let mut console = Console::new(session, config.camera.clone(), config.officer.clone())
        .with_frames_dir(cmd.frames);

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout().lock();
    console.run(input, &mut stdout).await?;
    Ok(())
}

fn handle_logs(cmd: &LogsCommand) -> anyhow::Result<()> {
    let logs = mock_access_logs();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
    } else {
        for line in access_log_lines(&logs) {
            println!("{line}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Camera]");
                println!("  Facing mode:        {}", config.camera.facing_mode);
                println!(
                    "  Resolution:         {}x{}",
                    config.camera.width, config.camera.height
                );
                println!("  Frame interval:     {} ms", config.camera.frame_interval_ms);
                println!();
                println!("[Latency]");
                println!("  Lookup:             {} ms", config.latency.lookup_ms);
                println!("  Mark safe:          {} ms", config.latency.mark_safe_ms);
                println!(
                    "  Flag assistance:    {} ms",
                    config.latency.flag_assistance_ms
                );
                println!(
                    "  Download report:    {} ms",
                    config.latency.download_report_ms
                );
                println!();
                println!("[Report]");
                println!("  Output directory:   {}", config.report_dir().display());
                println!();
                println!("[Officer]");
                println!("  Badge:              {}", config.officer.id);
                println!("  Name:               {}", config.officer.name);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
