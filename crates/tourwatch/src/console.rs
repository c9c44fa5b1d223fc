//! Line-oriented dashboard console.
//!
//! Reads one command per line and redraws the dashboard after every state
//! change. Camera events arrive on a channel and operator actions run as
//! tasks; both are handled between commands, so a scan or an action can
//! complete while the console waits for input.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::acquisition::{AcquisitionEvent, AcquisitionMode, DirectoryFrames};
use crate::actions::OperatorAction;
use crate::config::{CameraConfig, OfficerConfig};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::presentation::{access_log_lines, render_dashboard};
use crate::session::{ActionOutcome, Session};

const HELP: &str = "\
commands:
  start              start the camera (needs a frame directory)
  stop               stop the camera
  frames <dir>       use <dir> as the camera feed and start it
  mode camera|file   switch acquisition mode
  file <path>        scan a QR code image
  payload <text>     enter a QR payload by hand
  mark-safe          mark the tourist as safe
  flag               flag the tourist for assistance
  report             download the tourist report
  new                scan a new tourist
  show               redraw the dashboard
  logs               show the access log
  help               show this help
  quit               leave the session";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Start the camera on the current frame directory.
    Start,
    /// Stop the camera.
    Stop,
    /// Set the frame directory and start the camera.
    Frames(PathBuf),
    /// Switch acquisition mode.
    Mode(AcquisitionMode),
    /// Scan an image file.
    File(PathBuf),
    /// Submit a payload typed by the operator.
    Payload(String),
    /// Trigger an operator action.
    Action(OperatorAction),
    /// Return to acquisition.
    New,
    /// Redraw the dashboard.
    Show,
    /// Print the access log.
    Logs,
    /// Print usage.
    Help,
    /// End the session.
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a message for the operator if the line is not a command.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "frames" | "camera" => {
                Self::Frames(PathBuf::from(argument(word, rest, "a directory")?))
            }
            "mode" => match argument(word, rest, "`camera` or `file`")? {
                "camera" => Self::Mode(AcquisitionMode::Camera),
                "file" => Self::Mode(AcquisitionMode::File),
                other => return Err(format!("unknown mode `{other}`")),
            },
            "file" => Self::File(PathBuf::from(argument(word, rest, "an image path")?)),
            "payload" => Self::Payload(argument(word, rest, "the scanned text")?.to_string()),
            "mark-safe" | "safe" => Self::Action(OperatorAction::MarkSafe),
            "flag" | "flag-assistance" => Self::Action(OperatorAction::FlagAssistance),
            "report" | "download-report" => Self::Action(OperatorAction::DownloadReport),
            "new" => Self::New,
            "show" => Self::Show,
            "logs" => Self::Logs,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}` (try `help`)")),
        };
        Ok(Some(command))
    }
}

fn argument<'a>(word: &str, rest: &'a str, what: &str) -> std::result::Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("`{word}` needs {what}"))
    } else {
        Ok(rest)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive front end over a [`Session`].
#[derive(Debug)]
pub struct Console<G> {
    session: Session<G>,
    camera: CameraConfig,
    officer: OfficerConfig,
    frames_dir: Option<PathBuf>,
    events: Option<mpsc::Receiver<AcquisitionEvent>>,
    actions: JoinSet<ActionOutcome>,
}

impl<G: Gateway + 'static> Console<G> {
    /// Create a console over `session`.
    #[must_use]
    pub fn new(session: Session<G>, camera: CameraConfig, officer: OfficerConfig) -> Self {
        Self {
            session,
            camera,
            officer,
            frames_dir: None,
            events: None,
            actions: JoinSet::new(),
        }
    }

    /// Use `dir` as the camera feed for `start`.
    #[must_use]
    pub fn with_frames_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.frames_dir = dir;
        self
    }

    /// The session being driven.
    #[must_use]
    pub fn session(&self) -> &Session<G> {
        &self.session
    }

    /// Run until `quit` or end of input.
    ///
    /// Actions still in flight at that point are waited for.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        self.render(out)?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("console input closed");
                        break;
                    };
                    match ConsoleCommand::parse(&line) {
                        Ok(Some(command)) => {
                            if self.execute(command, out).await? == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(message) => writeln!(out, "{message}")?,
                    }
                }
                event = next_event(&mut self.events) => {
                    self.events = None;
                    match event {
                        Some(event) => {
                            self.session.handle_event(event).await;
                        }
                        None => {
                            self.session.stop_camera();
                            writeln!(out, "Camera feed ended without a QR code")?;
                        }
                    }
                    self.render(out)?;
                }
                Some(joined) = self.actions.join_next(), if !self.actions.is_empty() => {
                    self.settle(joined, out).await?;
                }
            }
        }

        while let Some(joined) = self.actions.join_next().await {
            self.settle(joined, out).await?;
        }
        self.session.stop_camera();
        Ok(())
    }

    async fn execute<W: Write>(&mut self, command: ConsoleCommand, out: &mut W) -> Result<Flow> {
        match command {
            ConsoleCommand::Start => self.start_camera(out)?,
            ConsoleCommand::Frames(dir) => {
                self.frames_dir = Some(dir);
                self.start_camera(out)?;
            }
            ConsoleCommand::Stop => {
                self.events = None;
                self.session.stop_camera();
                self.render(out)?;
            }
            ConsoleCommand::Mode(mode) => {
                self.events = None;
                self.session.switch_mode(mode);
                self.render(out)?;
            }
            ConsoleCommand::File(path) => {
                self.events = None;
                if let Err(err) = self.session.scan_file(path).await {
                    writeln!(out, "{}", err.operator_message())?;
                }
                self.render(out)?;
            }
            ConsoleCommand::Payload(text) => {
                self.events = None;
                self.session.stop_camera();
                if self.session.submit_scan(&text).await.is_none() {
                    writeln!(out, "Scan ignored")?;
                }
                self.render(out)?;
            }
            ConsoleCommand::Action(action) => self.begin_action(action, out)?,
            ConsoleCommand::New => {
                self.events = None;
                self.session.scan_new();
                self.render(out)?;
            }
            ConsoleCommand::Show => self.render(out)?,
            ConsoleCommand::Logs => {
                for line in access_log_lines(self.session.dashboard().access_logs()) {
                    writeln!(out, "{line}")?;
                }
            }
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn start_camera<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let Some(dir) = self.frames_dir.clone() else {
            writeln!(out, "No camera feed set; use `frames <dir>`")?;
            return Ok(());
        };
        match self
            .session
            .start_camera(DirectoryFrames::new(dir), &self.camera)
        {
            Ok(events) => self.events = Some(events),
            Err(err) => writeln!(out, "{}", err.operator_message())?,
        }
        self.render(out)
    }

    fn begin_action<W: Write>(&mut self, action: OperatorAction, out: &mut W) -> Result<()> {
        let pending = match self.session.begin_action(action) {
            Ok(pending) => pending,
            Err(Error::ActionUnavailable { action }) => {
                writeln!(out, "{} is not available", action.label())?;
                return Ok(());
            }
            Err(err) => {
                writeln!(out, "{}", err.operator_message())?;
                return Ok(());
            }
        };

        writeln!(out, "{}", action.loading_label())?;
        self.actions.spawn(self.session.submit_action(pending));
        self.render(out)
    }

    async fn settle<W: Write>(
        &mut self,
        joined: std::result::Result<ActionOutcome, JoinError>,
        out: &mut W,
    ) -> Result<()> {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "action task did not finish");
                return Ok(());
            }
        };

        let action = outcome.action();
        let notification = self.session.complete_action(outcome).await;
        writeln!(out, "{notification}")?;
        if action == OperatorAction::DownloadReport {
            if let Some(path) = self.session.last_report() {
                writeln!(out, "Report: {}", path.display())?;
            }
        }
        self.render(out)
    }

    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "{}",
            render_dashboard(
                self.session.dashboard(),
                self.session.panel(),
                &self.officer
            )
        )?;
        out.flush()?;
        Ok(())
    }
}

async fn next_event(
    events: &mut Option<mpsc::Receiver<AcquisitionEvent>>,
) -> Option<AcquisitionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::acquisition::decode::render_qr;
    use crate::dashboard::Phase;
    use crate::gateway::{ActionError, SimulatedGateway};
    use crate::profile::Status;
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;

    /// A registry that accepts the first action and rejects the rest.
    #[derive(Debug, Default)]
    struct FlakyGateway {
        submitted: AtomicUsize,
    }

    #[async_trait]
    impl Gateway for FlakyGateway {
        async fn lookup(&self, _payload: &str) {}

        async fn submit(
            &self,
            action: OperatorAction,
            _tourist_id: &str,
        ) -> std::result::Result<(), ActionError> {
            if self.submitted.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(())
            } else {
                Err(ActionError::rejected(action, "registry offline"))
            }
        }
    }

    /// Feed `lines` to the console one at a time, pausing after each.
    async fn run_slowly<G: Gateway + 'static>(console: &mut Console<G>, lines: &[&str]) -> String {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let script: Vec<String> = lines.iter().map(|line| format!("{line}\n")).collect();
        let feeder = async move {
            for line in script {
                writer.write_all(line.as_bytes()).await.unwrap();
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };

        let mut out = Vec::new();
        let (result, ()) = tokio::join!(
            console.run(tokio::io::BufReader::new(reader), &mut out),
            feeder
        );
        result.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn console() -> Console<SimulatedGateway> {
        Console::new(
            Session::new(SimulatedGateway::instant()),
            CameraConfig::default(),
            OfficerConfig::default(),
        )
    }

    async fn run(console: &mut Console<SimulatedGateway>, script: &str) -> String {
        let mut out = Vec::new();
        console.run(script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("  "), Ok(None));
        assert_eq!(ConsoleCommand::parse("start"), Ok(Some(ConsoleCommand::Start)));
        assert_eq!(
            ConsoleCommand::parse("mode file"),
            Ok(Some(ConsoleCommand::Mode(AcquisitionMode::File)))
        );
        assert_eq!(
            ConsoleCommand::parse("payload {\"id\": \"T1\"}"),
            Ok(Some(ConsoleCommand::Payload("{\"id\": \"T1\"}".to_string())))
        );
        assert_eq!(
            ConsoleCommand::parse("FLAG"),
            Ok(Some(ConsoleCommand::Action(OperatorAction::FlagAssistance)))
        );
        assert_eq!(
            ConsoleCommand::parse("file ./qr codes/a.png"),
            Ok(Some(ConsoleCommand::File(PathBuf::from("./qr codes/a.png"))))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ConsoleCommand::parse("payload").unwrap_err().contains("needs"));
        assert!(ConsoleCommand::parse("mode video")
            .unwrap_err()
            .contains("unknown mode"));
        assert!(ConsoleCommand::parse("dance")
            .unwrap_err()
            .contains("unknown command"));
    }

    #[tokio::test]
    async fn test_payload_then_flag() {
        let mut console = console();
        let out = run(&mut console, "payload T999\nflag\nquit\n").await;

        assert!(out.contains("QR Code ID: T999"));
        assert!(out.contains("Creating Alert..."));
        assert!(out.contains("[ok] Assistance Alert Created"));
        assert!(out.contains("!! SOS ALERT ACTIVE"));
        assert_eq!(console.session().dashboard().status(), Status::Danger);
    }

    #[tokio::test]
    async fn test_mark_safe_unavailable_when_safe() {
        let mut console = console();
        let out = run(&mut console, "payload T1\nmark-safe\n").await;
        assert!(out.contains("Mark Tourist as Safe is not available"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_reported() {
        let mut console = console();
        let out = run(&mut console, "dance\n").await;
        assert!(out.contains("unknown command `dance`"));
    }

    #[tokio::test]
    async fn test_start_without_frames() {
        let mut console = console();
        let out = run(&mut console, "start\n").await;
        assert!(out.contains("No camera feed set"));
        assert!(!console.session().dashboard().acquisition().active);
    }

    #[tokio::test]
    async fn test_camera_scan_completes_while_waiting() {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        render_qr(r#"{"id":"T42","name":"Ravi Kumar"}"#)
            .save(dir.path().join("frame.png"))
            .unwrap();

        let (mut writer, reader) = tokio::io::duplex(256);
        let mut console = console();
        let script = format!("frames {}\n", dir.path().display());

        let feeder = async move {
            writer.write_all(script.as_bytes()).await.unwrap();
            // Keep input open until the scan lands.
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            writer.write_all(b"quit\n").await.unwrap();
        };

        let mut out = Vec::new();
        let (result, ()) = tokio::join!(
            console.run(tokio::io::BufReader::new(reader), &mut out),
            feeder
        );
        result.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("(RK) Ravi Kumar"));
        assert_eq!(console.session().dashboard().phase(), Phase::Reviewing);
    }

    #[tokio::test]
    async fn test_report_written_from_console() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = Console::new(
            Session::new(SimulatedGateway::instant()).with_report_dir(dir.path()),
            CameraConfig::default(),
            OfficerConfig::default(),
        );
        let out = run(&mut console, "payload T5\nreport\n").await;

        assert!(out.contains("[ok] Report Downloaded"));
        assert!(out.contains("Report: "));
        assert!(console.session().last_report().unwrap().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_run_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = Console::new(
            Session::new(SimulatedGateway::default()).with_report_dir(dir.path()),
            CameraConfig::default(),
            OfficerConfig::default(),
        );
        let out = run(&mut console, "payload T1\nflag\nreport\n").await;

        let report_started = out.find("Generating PDF...").unwrap();
        let flag_done = out.find("[ok] Assistance Alert Created").unwrap();
        assert!(report_started < flag_done);
        assert!(out.contains("[ok] Report Downloaded"));
        assert!(!out.contains("is not available"));
        assert_eq!(console.session().dashboard().status(), Status::Danger);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_report_does_not_repeat_old_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = Console::new(
            Session::new(FlakyGateway::default()).with_report_dir(dir.path()),
            CameraConfig::default(),
            OfficerConfig::default(),
        );
        let out = run_slowly(&mut console, &["payload T1", "report", "report", "quit"]).await;

        let (first, second) = out.split_once("[!!] Error: ").unwrap();
        assert!(first.contains("[ok] Report Downloaded"));
        assert!(first.contains("Report: "));
        assert!(!second.contains("Report: "));
        assert!(console.session().last_report().is_none());
    }

    #[tokio::test]
    async fn test_logs_command() {
        let mut console = console();
        let out = run(&mut console, "logs\n").await;
        assert!(out.contains("Initial Registration"));
    }
}
