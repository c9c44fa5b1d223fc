//! An officer's working session.
//!
//! [`Session`] drives a [`Dashboard`] through the asynchronous parts of the
//! workflow: camera tasks, file decoding, registry lookups and operator
//! actions. It owns the only copy of the dashboard, so every state change
//! happens on the caller's task.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::acquisition::{
    scan_file, AcquisitionError, AcquisitionEvent, AcquisitionMode, CameraOutcome, CameraScanner,
    FilePicker, FrameSource, ScanHandle,
};
use crate::actions::{ActionPanel, Notification, OperatorAction};
use crate::config::CameraConfig;
use crate::dashboard::{Dashboard, PendingScan, Phase};
use crate::error::{Error, Result};
use crate::gateway::{ActionError, Gateway};
use crate::profile::TouristRecord;

/// A running camera scan.
#[derive(Debug)]
struct CameraTask {
    handle: ScanHandle,
    join: JoinHandle<CameraOutcome>,
}

/// An operator action the panel accepted, waiting on the registry.
///
/// The action stays pending until the token comes back through
/// [`Session::complete_action`].
#[derive(Debug)]
#[must_use = "an action stays pending until it is completed"]
pub struct PendingAction {
    action: OperatorAction,
    tourist_id: String,
}

impl PendingAction {
    /// The action in flight.
    #[must_use]
    pub fn action(&self) -> OperatorAction {
        self.action
    }

    /// The tourist the action was started for.
    #[must_use]
    pub fn tourist_id(&self) -> &str {
        &self.tourist_id
    }
}

/// The registry's answer to a [`PendingAction`].
#[derive(Debug)]
#[must_use = "an action stays pending until it is completed"]
pub struct ActionOutcome {
    pending: PendingAction,
    result: std::result::Result<(), ActionError>,
}

impl ActionOutcome {
    /// The action that was answered.
    #[must_use]
    pub fn action(&self) -> OperatorAction {
        self.pending.action
    }
}

/// Dashboard state plus everything needed to act on it.
#[derive(Debug)]
pub struct Session<G> {
    dashboard: Dashboard,
    panel: ActionPanel,
    gateway: Arc<G>,
    picker: FilePicker,
    camera: Option<CameraTask>,
    report_dir: Option<PathBuf>,
    last_report: Option<PathBuf>,
}

impl<G: Gateway> Session<G> {
    /// Create a session with a fresh dashboard.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self::with_dashboard(gateway, Dashboard::default())
    }

    /// Create a session around an existing dashboard.
    #[must_use]
    pub fn with_dashboard(gateway: G, dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            panel: ActionPanel::new(),
            gateway: Arc::new(gateway),
            picker: FilePicker::new(),
            camera: None,
            report_dir: None,
            last_report: None,
        }
    }

    /// Write generated reports into `dir`.
    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// The dashboard state.
    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// The action panel state.
    #[must_use]
    pub fn panel(&self) -> &ActionPanel {
        &self.panel
    }

    /// Where the most recent report was written, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&Path> {
        self.last_report.as_deref()
    }

    /// Check if a camera task is still scanning.
    #[must_use]
    pub fn is_camera_running(&self) -> bool {
        self.camera
            .as_ref()
            .is_some_and(|task| !task.handle.should_stop() && !task.join.is_finished())
    }

    /// Resolve a raw scanned payload and load the tourist.
    ///
    /// Returns `None` if the dashboard dropped the payload.
    pub async fn submit_scan(&mut self, raw: &str) -> Option<&TouristRecord> {
        let pending = self.dashboard.accept_scan(raw)?;
        Some(self.resolve(pending).await)
    }

    /// Apply an acquisition event.
    ///
    /// Returns the loaded tourist when the event was a decode that the
    /// dashboard accepted.
    pub async fn handle_event(&mut self, event: AcquisitionEvent) -> Option<&TouristRecord> {
        let pending = self.dashboard.handle_acquisition(event);
        if !self.dashboard.acquisition().active {
            self.release_camera();
        }
        Some(self.resolve(pending?).await)
    }

    async fn resolve(&mut self, pending: PendingScan) -> &TouristRecord {
        // An accepted scan ends acquisition, whichever source it came from.
        self.release_camera();
        self.gateway.lookup(pending.payload()).await;
        self.dashboard.complete_scan(pending, Utc::now())
    }

    /// Decode the QR code in an image file and load the tourist.
    ///
    /// Switches to file mode first. A failed decode is recorded on the
    /// dashboard and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReviewInProgress`] while a tourist is under review.
    pub async fn scan_file(&mut self, path: impl Into<PathBuf>) -> Result<Option<&TouristRecord>> {
        if self.dashboard.phase() == Phase::Reviewing {
            return Err(Error::ReviewInProgress);
        }
        self.switch_mode(AcquisitionMode::File);
        self.picker.choose(path);

        match scan_file(&mut self.picker).await {
            Some(event) => Ok(self.handle_event(event).await),
            None => Ok(None),
        }
    }

    /// Start scanning frames from `source` on a background task.
    ///
    /// The returned receiver yields at most one event; feed it back through
    /// [`handle_event`](Self::handle_event).
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::AlreadyRunning`] if a camera scan is in
    /// progress and [`Error::ReviewInProgress`] while a tourist is under
    /// review.
    pub fn start_camera<S>(
        &mut self,
        source: S,
        camera: &CameraConfig,
    ) -> Result<mpsc::Receiver<AcquisitionEvent>>
    where
        S: FrameSource + 'static,
    {
        if self.is_camera_running() {
            return Err(AcquisitionError::AlreadyRunning.into());
        }
        self.dashboard.switch_mode(AcquisitionMode::Camera);
        if !self.dashboard.start_scan() {
            return Err(Error::ReviewInProgress);
        }

        let scanner = CameraScanner::new(source, camera.constraints(), camera.frame_interval());
        let handle = scanner.handle();
        let (tx, rx) = mpsc::channel(1);
        let join = tokio::spawn(scanner.run(tx));
        self.camera = Some(CameraTask { handle, join });
        Ok(rx)
    }

    /// Stop any camera scan.
    pub fn stop_camera(&mut self) {
        self.release_camera();
        self.dashboard.stop_scan();
    }

    fn release_camera(&mut self) {
        if let Some(task) = self.camera.take() {
            task.handle.stop();
            task.join.abort();
            debug!("camera task released");
        }
    }

    /// Switch acquisition mode, stopping any camera scan.
    pub fn switch_mode(&mut self, mode: AcquisitionMode) {
        self.release_camera();
        self.dashboard.switch_mode(mode);
    }

    /// Discard the tourist under review and return to acquisition.
    pub fn scan_new(&mut self) {
        self.release_camera();
        self.dashboard.scan_new();
    }

    /// Mark `action` as pending for the tourist under review.
    ///
    /// Each action is refused only while it is itself pending (or, for
    /// mark-safe, while the tourist is already safe), so different actions
    /// can be in flight together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTourist`] when nothing is under review and
    /// [`Error::ActionUnavailable`] when the action is not enabled.
    pub fn begin_action(&mut self, action: OperatorAction) -> Result<PendingAction> {
        let Some(tourist_id) = self.dashboard.record().map(|r| r.id.clone()) else {
            debug!(%action, "action refused: no tourist under review");
            return Err(Error::NoActiveTourist);
        };
        if !self.panel.begin(action, self.dashboard.status()) {
            debug!(%action, "action refused: not available");
            return Err(Error::ActionUnavailable { action });
        }
        debug!(%action, tourist_id = %tourist_id, "action pending");
        Ok(PendingAction { action, tourist_id })
    }

    /// Complete a pending action: apply its effect and say how it went.
    ///
    /// A failed action leaves the status unchanged. Either way the action
    /// is no longer pending afterwards.
    pub async fn complete_action(&mut self, outcome: ActionOutcome) -> Notification {
        let ActionOutcome { pending, result } = outcome;
        let PendingAction { action, tourist_id } = pending;

        let result = match result {
            Ok(()) => self.apply(action).await,
            Err(err) => Err(err),
        };
        self.panel.finish(action);

        match result {
            Ok(()) => {
                info!(%action, tourist_id = %tourist_id, "action completed");
                action.success()
            }
            Err(err) => {
                warn!(%action, tourist_id = %tourist_id, error = %err, "action failed");
                action.failure()
            }
        }
    }

    async fn apply(&mut self, action: OperatorAction) -> std::result::Result<(), ActionError> {
        match action {
            OperatorAction::MarkSafe => self.dashboard.mark_safe(),
            OperatorAction::FlagAssistance => self.dashboard.flag_assistance(),
            OperatorAction::DownloadReport => {
                self.last_report = None;
                let Some(report) = self.dashboard.download_report(Utc::now()) else {
                    return Ok(());
                };
                match &self.report_dir {
                    Some(dir) => self.last_report = Some(report.write_to(dir).await?),
                    None => debug!(
                        tourist_id = %report.tourist.id,
                        "no report directory configured; report not written"
                    ),
                }
            }
        }
        Ok(())
    }
}

impl<G: Gateway + 'static> Session<G> {
    /// Send a pending action to the registry.
    ///
    /// The returned future does not borrow the session, so several actions
    /// can wait on the registry at once. Hand its output to
    /// [`complete_action`](Self::complete_action).
    pub fn submit_action(
        &self,
        pending: PendingAction,
    ) -> impl Future<Output = ActionOutcome> + Send + 'static {
        let gateway = Arc::clone(&self.gateway);
        async move {
            let result = gateway.submit(pending.action, &pending.tourist_id).await;
            ActionOutcome { pending, result }
        }
    }

    /// Carry out an operator action from start to finish.
    ///
    /// # Errors
    ///
    /// Returns the [`begin_action`](Self::begin_action) errors when the
    /// action cannot start. A failure reported by the registry is not an
    /// error here; it comes back as a failure notification.
    pub async fn perform(&mut self, action: OperatorAction) -> Result<Notification> {
        let pending = self.begin_action(action)?;
        let outcome = self.submit_action(pending).await;
        Ok(self.complete_action(outcome).await)
    }
}

impl<G> Drop for Session<G> {
    fn drop(&mut self) {
        if let Some(task) = self.camera.take() {
            task.handle.stop();
            task.join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::decode::render_qr;
    use crate::acquisition::{CameraConstraints, DirectoryFrames};
    use crate::gateway::SimulatedGateway;
    use crate::profile::Status;
    use async_trait::async_trait;
    use image::DynamicImage;

    /// A registry that rejects every action.
    struct RejectingGateway;

    #[async_trait]
    impl Gateway for RejectingGateway {
        async fn lookup(&self, _payload: &str) {}

        async fn submit(
            &self,
            action: OperatorAction,
            _tourist_id: &str,
        ) -> std::result::Result<(), ActionError> {
            Err(ActionError::rejected(action, "registry offline"))
        }
    }

    /// A camera that never produces a frame.
    struct IdleCamera;

    #[async_trait]
    impl FrameSource for IdleCamera {
        fn describe(&self) -> String {
            "idle".to_string()
        }

        async fn open(
            &mut self,
            _: &CameraConstraints,
        ) -> std::result::Result<(), AcquisitionError> {
            Ok(())
        }

        async fn next_frame(&mut self) -> std::result::Result<Option<DynamicImage>, AcquisitionError> {
            std::future::pending().await
        }
    }

    /// A camera that loses its device shortly after opening.
    struct FailingCamera;

    #[async_trait]
    impl FrameSource for FailingCamera {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn open(
            &mut self,
            _: &CameraConstraints,
        ) -> std::result::Result<(), AcquisitionError> {
            Ok(())
        }

        async fn next_frame(&mut self) -> std::result::Result<Option<DynamicImage>, AcquisitionError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Err(AcquisitionError::camera_unavailable("device lost"))
        }
    }

    async fn reviewing<G: Gateway>(gateway: G, raw: &str) -> Session<G> {
        let mut session = Session::new(gateway);
        session.submit_scan(raw).await.expect("scan accepted");
        session
    }

    #[tokio::test]
    async fn test_submit_scan_loads_tourist() {
        let mut session = Session::new(SimulatedGateway::instant());
        let record = session
            .submit_scan(r#"{"id":"T777","name":"Alice"}"#)
            .await
            .unwrap();

        assert_eq!(record.id, "T777");
        assert_eq!(record.name, "Alice");
        assert_eq!(session.dashboard().phase(), Phase::Reviewing);
        assert!(!session.dashboard().is_scan_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_latency_is_awaited() {
        let mut session = Session::new(SimulatedGateway::default());
        let started = tokio::time::Instant::now();
        session.submit_scan("T1").await.unwrap();
        assert!(started.elapsed() >= std::time::Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_flag_then_mark_safe_scenario() {
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;

        let n = session.perform(OperatorAction::FlagAssistance).await.unwrap();
        assert_eq!(n.title, "Assistance Alert Created");
        assert_eq!(session.dashboard().status(), Status::Danger);
        assert_eq!(session.dashboard().record().unwrap().status, Status::Danger);

        let n = session.perform(OperatorAction::MarkSafe).await.unwrap();
        assert_eq!(n.title, "Tourist Marked as Safe");
        assert_eq!(session.dashboard().status(), Status::Safe);
        assert_eq!(session.dashboard().phase(), Phase::Reviewing);
    }

    #[tokio::test]
    async fn test_mark_safe_refused_when_already_safe() {
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;
        let err = session.perform(OperatorAction::MarkSafe).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ActionUnavailable {
                action: OperatorAction::MarkSafe
            }
        ));
    }

    #[tokio::test]
    async fn test_actions_refused_without_tourist() {
        let mut session = Session::new(SimulatedGateway::instant());
        for action in OperatorAction::ALL {
            let err = session.perform(action).await.unwrap_err();
            assert!(matches!(err, Error::NoActiveTourist));
            assert!(!session.panel().is_pending(action));
        }
        assert_eq!(session.dashboard().status(), Status::Safe);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_actions_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SimulatedGateway::default()).with_report_dir(dir.path());
        session.submit_scan("T1").await.unwrap();

        let flag = session.begin_action(OperatorAction::FlagAssistance).unwrap();
        let report = session.begin_action(OperatorAction::DownloadReport).unwrap();
        assert_eq!(flag.tourist_id(), "T1");
        assert_eq!(
            session.panel().button_label(OperatorAction::FlagAssistance),
            "Creating Alert..."
        );
        assert_eq!(
            session.panel().button_label(OperatorAction::DownloadReport),
            "Generating PDF..."
        );
        assert!(matches!(
            session.begin_action(OperatorAction::FlagAssistance),
            Err(Error::ActionUnavailable { .. })
        ));

        let started = tokio::time::Instant::now();
        let (flagged, reported) = tokio::join!(
            session.submit_action(flag),
            session.submit_action(report)
        );
        // 1000 ms and 1500 ms of latency, waited out side by side.
        assert!(started.elapsed() < std::time::Duration::from_millis(2500));

        let n = session.complete_action(flagged).await;
        assert_eq!(n.title, "Assistance Alert Created");
        assert!(session.panel().is_pending(OperatorAction::DownloadReport));

        let n = session.complete_action(reported).await;
        assert_eq!(n.title, "Report Downloaded");
        assert_eq!(session.dashboard().status(), Status::Danger);
        for action in OperatorAction::ALL {
            assert!(!session.panel().is_pending(action));
        }
    }

    #[tokio::test]
    async fn test_rejected_action_keeps_status() {
        crate::logging::init_test_logging();
        let mut session = reviewing(RejectingGateway, "T1").await;

        let n = session.perform(OperatorAction::FlagAssistance).await.unwrap();
        assert!(n.is_error());
        assert_eq!(n.description, "Failed to create alert. Please try again.");
        assert_eq!(session.dashboard().status(), Status::Safe);
        assert!(!session.panel().is_pending(OperatorAction::FlagAssistance));
    }

    #[tokio::test]
    async fn test_download_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SimulatedGateway::instant()).with_report_dir(dir.path());
        session.submit_scan(r#"{"id":"T777"}"#).await.unwrap();

        let n = session.perform(OperatorAction::DownloadReport).await.unwrap();
        assert_eq!(n.title, "Report Downloaded");
        assert_eq!(session.dashboard().status(), Status::Safe);

        let path = session.last_report().unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_download_report_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let mut session = Session::new(SimulatedGateway::instant()).with_report_dir(&blocker);
        session.submit_scan("T1").await.unwrap();

        let n = session.perform(OperatorAction::DownloadReport).await.unwrap();
        assert!(n.is_error());
        assert!(session.last_report().is_none());
    }

    #[tokio::test]
    async fn test_failed_report_clears_previous_path() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let mut session = Session::new(SimulatedGateway::instant()).with_report_dir(&reports);
        session.submit_scan("T1").await.unwrap();

        let n = session.perform(OperatorAction::DownloadReport).await.unwrap();
        assert!(!n.is_error());
        assert!(session.last_report().is_some());

        std::fs::remove_dir_all(&reports).unwrap();
        std::fs::write(&reports, "not a directory").unwrap();

        let n = session.perform(OperatorAction::DownloadReport).await.unwrap();
        assert!(n.is_error());
        assert!(session.last_report().is_none());
    }

    #[tokio::test]
    async fn test_download_report_without_directory() {
        crate::logging::init_test_logging();
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;

        let n = session.perform(OperatorAction::DownloadReport).await.unwrap();
        assert_eq!(n.title, "Report Downloaded");
        assert!(session.last_report().is_none());
        assert!(!session.panel().is_pending(OperatorAction::DownloadReport));
    }

    #[tokio::test]
    async fn test_scan_file_loads_tourist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.png");
        render_qr(r#"{"id":"T777","name":"Alice"}"#).save(&path).unwrap();

        let mut session = Session::new(SimulatedGateway::instant());
        let record = session.scan_file(&path).await.unwrap().unwrap();

        assert_eq!(record.id, "T777");
        assert_eq!(session.dashboard().acquisition().mode, AcquisitionMode::File);
    }

    #[tokio::test]
    async fn test_scan_file_without_code_sets_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        image::GrayImage::from_pixel(64, 64, image::Luma([255]))
            .save(&path)
            .unwrap();

        let mut session = Session::new(SimulatedGateway::instant());
        assert!(session.scan_file(&path).await.unwrap().is_none());
        assert_eq!(
            session.dashboard().error(),
            Some("No QR code found in the image")
        );
        assert_eq!(session.dashboard().phase(), Phase::Acquiring);
    }

    #[tokio::test]
    async fn test_scan_file_refused_while_reviewing() {
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;
        let err = session.scan_file("whatever.png").await.unwrap_err();
        assert!(matches!(err, Error::ReviewInProgress));
    }

    #[tokio::test]
    async fn test_camera_scan_loads_tourist() {
        let dir = tempfile::tempdir().unwrap();
        render_qr(r#"{"id":"T42","name":"Ravi"}"#)
            .save(dir.path().join("0001.png"))
            .unwrap();

        let mut session = Session::new(SimulatedGateway::instant());
        let mut rx = session
            .start_camera(DirectoryFrames::new(dir.path()), &CameraConfig::default())
            .unwrap();
        assert!(session.dashboard().acquisition().active);

        let event = rx.recv().await.unwrap();
        let record = session.handle_event(event).await.unwrap();
        assert_eq!(record.name, "Ravi");
        assert!(!session.dashboard().acquisition().active);
        assert!(!session.is_camera_running());
    }

    #[tokio::test]
    async fn test_camera_unavailable_sets_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SimulatedGateway::instant());
        let mut rx = session
            .start_camera(
                DirectoryFrames::new(dir.path().join("missing")),
                &CameraConfig::default(),
            )
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert!(session.handle_event(event).await.is_none());
        assert_eq!(
            session.dashboard().error(),
            Some("Camera access denied or unavailable")
        );
        assert!(!session.dashboard().acquisition().active);
    }

    #[tokio::test]
    async fn test_second_camera_start_is_refused() {
        let mut session = Session::new(SimulatedGateway::instant());
        let _rx = session
            .start_camera(IdleCamera, &CameraConfig::default())
            .unwrap();

        let err = session
            .start_camera(IdleCamera, &CameraConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Acquisition(AcquisitionError::AlreadyRunning)
        ));

        session.stop_camera();
        assert!(!session.is_camera_running());
        assert!(!session.dashboard().acquisition().active);
    }

    #[tokio::test]
    async fn test_switch_mode_stops_camera() {
        let mut session = Session::new(SimulatedGateway::instant());
        let _rx = session
            .start_camera(IdleCamera, &CameraConfig::default())
            .unwrap();

        session.switch_mode(AcquisitionMode::File);
        assert!(!session.is_camera_running());
        assert!(!session.dashboard().acquisition().active);
    }

    #[tokio::test]
    async fn test_camera_refused_while_reviewing() {
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;
        let err = session
            .start_camera(IdleCamera, &CameraConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::ReviewInProgress));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_scan_releases_camera() {
        let mut session = Session::new(SimulatedGateway::instant());
        let mut rx = session
            .start_camera(FailingCamera, &CameraConfig::default())
            .unwrap();

        session.submit_scan("T1").await.unwrap();
        assert!(!session.is_camera_running());

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        while let Some(event) = rx.recv().await {
            assert!(session.handle_event(event).await.is_none());
        }

        // A failure that still reaches the session cannot end the review.
        let late = AcquisitionEvent::Failed(AcquisitionError::camera_unavailable("device lost"));
        assert!(session.handle_event(late).await.is_none());
        assert_eq!(session.dashboard().phase(), Phase::Reviewing);
        assert_eq!(session.dashboard().record().unwrap().id, "T1");
        assert!(session.dashboard().error().is_none());
    }

    #[tokio::test]
    async fn test_scan_new_returns_to_acquisition() {
        let mut session = reviewing(SimulatedGateway::instant(), "T1").await;
        session.scan_new();
        assert_eq!(session.dashboard().phase(), Phase::Acquiring);
        assert!(session.submit_scan("T2").await.is_some());
    }
}
