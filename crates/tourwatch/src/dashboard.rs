//! The dashboard orchestrator.
//!
//! [`Dashboard`] is the single owner of session state: the current status,
//! the tourist under review, acquisition mode, and the last acquisition
//! error. It is synchronous; the awaiting happens in
//! [`Session`](crate::session::Session), which feeds results back in.
//!
//! The dashboard is in one of two phases:
//!
//! - [`Phase::Acquiring`]: no tourist; the scanner is shown.
//! - [`Phase::Reviewing`]: a tourist record is shown with its actions.
//!
//! Acquiring moves to Reviewing only when a scan completes, and Reviewing
//! moves back only through [`Dashboard::scan_new`]. Status changes never
//! change the phase.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::acquisition::{AcquisitionError, AcquisitionEvent, AcquisitionMode};
use crate::interpret::interpret;
use crate::profile::{mock_access_logs, AccessLogEntry, Status, TouristRecord};
use crate::report::TouristReport;

/// Which view the dashboard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for a scan.
    Acquiring,
    /// Showing a scanned tourist.
    Reviewing,
}

/// Scanner state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AcquisitionState {
    /// Selected acquisition mode.
    pub mode: AcquisitionMode,
    /// Whether the camera is scanning.
    pub active: bool,
}

/// A scan payload accepted for interpretation.
///
/// Holding one means the dashboard's pending flag is set; pass it back to
/// [`Dashboard::complete_scan`] once the lookup has finished.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an accepted scan blocks further scans until it is completed"]
pub struct PendingScan {
    payload: String,
}

impl PendingScan {
    /// The trimmed scanned text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Session state for one officer.
#[derive(Debug)]
pub struct Dashboard {
    status: Status,
    record: Option<TouristRecord>,
    acquisition: AcquisitionState,
    scan_pending: bool,
    error: Option<String>,
    access_logs: Vec<AccessLogEntry>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(mock_access_logs())
    }
}

impl Dashboard {
    /// Create a dashboard showing the given access log.
    #[must_use]
    pub fn new(access_logs: Vec<AccessLogEntry>) -> Self {
        Self {
            status: Status::default(),
            record: None,
            acquisition: AcquisitionState::default(),
            scan_pending: false,
            error: None,
            access_logs,
        }
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.record.is_some() {
            Phase::Reviewing
        } else {
            Phase::Acquiring
        }
    }

    /// The authoritative current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The tourist under review, if any.
    #[must_use]
    pub fn record(&self) -> Option<&TouristRecord> {
        self.record.as_ref()
    }

    /// Scanner state.
    #[must_use]
    pub fn acquisition(&self) -> AcquisitionState {
        self.acquisition
    }

    /// The last acquisition error message, if not yet cleared.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The access log, in the order it was supplied.
    #[must_use]
    pub fn access_logs(&self) -> &[AccessLogEntry] {
        &self.access_logs
    }

    /// Check if a scan is waiting for its lookup to finish.
    #[must_use]
    pub fn is_scan_pending(&self) -> bool {
        self.scan_pending
    }

    /// Start camera scanning. Only possible while acquiring.
    ///
    /// Returns whether scanning is now active.
    pub fn start_scan(&mut self) -> bool {
        if self.phase() == Phase::Reviewing {
            debug!("start-scan ignored while reviewing");
            return false;
        }
        self.acquisition.active = true;
        info!(mode = %self.acquisition.mode, "scanning started");
        true
    }

    /// Stop camera scanning.
    pub fn stop_scan(&mut self) {
        if self.acquisition.active {
            info!("scanning stopped");
        }
        self.acquisition.active = false;
    }

    /// Switch acquisition mode. Any running scan stops.
    pub fn switch_mode(&mut self, mode: AcquisitionMode) {
        if self.acquisition.mode != mode {
            info!(from = %self.acquisition.mode, to = %mode, "acquisition mode switched");
        }
        self.acquisition.mode = mode;
        self.acquisition.active = false;
    }

    /// Route an acquisition event.
    ///
    /// A decoded payload is offered to [`accept_scan`](Self::accept_scan); a
    /// failure is recorded through [`acquisition_failed`](Self::acquisition_failed).
    pub fn handle_acquisition(&mut self, event: AcquisitionEvent) -> Option<PendingScan> {
        match event {
            AcquisitionEvent::Decoded { mode, text } => {
                debug!(%mode, "scan decoded");
                self.accept_scan(&text)
            }
            AcquisitionEvent::Failed(err) => {
                self.acquisition_failed(&err);
                None
            }
        }
    }

    /// Accept a scanned payload for interpretation.
    ///
    /// Returns `None` (dropping the payload) while another scan is pending,
    /// while a tourist is under review, or when the payload is blank. On
    /// acceptance scanning turns off, whichever mode produced the payload.
    pub fn accept_scan(&mut self, raw: &str) -> Option<PendingScan> {
        if self.scan_pending {
            debug!("scan dropped: another scan is pending");
            return None;
        }
        if self.phase() == Phase::Reviewing {
            debug!("scan dropped: a tourist is under review");
            return None;
        }

        let payload = raw.trim();
        if payload.is_empty() {
            debug!("scan dropped: empty payload");
            return None;
        }

        self.scan_pending = true;
        self.acquisition.active = false;
        Some(PendingScan {
            payload: payload.to_string(),
        })
    }

    /// Finish a pending scan: build the record and enter review.
    ///
    /// The record takes the status current at this moment. A completion that
    /// arrives after the operator moved on still replaces the record.
    pub fn complete_scan(&mut self, pending: PendingScan, scanned_at: DateTime<Utc>) -> &TouristRecord {
        let record = interpret(&pending.payload, self.status, scanned_at);
        info!(tourist_id = %record.id, status = %record.status, "tourist loaded");

        self.scan_pending = false;
        self.error = None;
        self.record.insert(record)
    }

    /// Record an acquisition failure.
    ///
    /// The operator-facing message is kept until the next successful scan
    /// and scanning stops so the operator can retry. A failure that arrives
    /// while a tourist is under review is dropped; only scan-new leaves
    /// review.
    pub fn acquisition_failed(&mut self, err: &AcquisitionError) {
        if self.phase() == Phase::Reviewing {
            debug!(error = %err, "acquisition failure dropped: a tourist is under review");
            return;
        }
        warn!(error = %err, "acquisition failed");
        self.error = Some(err.user_message().to_string());
        self.acquisition.active = false;
    }

    /// Set the status, mirroring it into the active record.
    pub fn set_status(&mut self, status: Status) {
        if self.status != status {
            info!(from = %self.status, to = %status, "status changed");
        }
        self.status = status;
        if let Some(record) = self.record.as_mut() {
            record.status = status;
        }
    }

    /// Mark-safe callback.
    pub fn mark_safe(&mut self) {
        self.set_status(Status::Safe);
    }

    /// Flag-assistance callback.
    pub fn flag_assistance(&mut self) {
        self.set_status(Status::Danger);
    }

    /// Download-report callback: snapshot the tourist under review.
    #[must_use]
    pub fn download_report(&self, generated_at: DateTime<Utc>) -> Option<TouristReport> {
        let tourist = self.record.clone()?;
        Some(TouristReport {
            generated_at,
            status: self.status,
            tourist,
            access_logs: self.access_logs.clone(),
        })
    }

    /// Discard the tourist under review and return to acquisition.
    pub fn scan_new(&mut self) {
        if let Some(record) = self.record.take() {
            info!(tourist_id = %record.id, "tourist dismissed");
        }
        self.acquisition.active = false;
    }
}
