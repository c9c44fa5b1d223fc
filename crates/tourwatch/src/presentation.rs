//! Text rendering of the dashboard panels.
//!
//! Every view here is a pure function of the data handed to it. The only
//! branching is on [`Status`], and both the profile and the location panel
//! take their badge from the same [`status_style`].

use std::fmt::{self, Display, Formatter};

use crate::acquisition::AcquisitionMode;
use crate::actions::{ActionPanel, OperatorAction};
use crate::config::OfficerConfig;
use crate::dashboard::{Dashboard, Phase};
use crate::profile::{AccessLogEntry, Location, Status, TouristRecord};

/// Shown instead of an empty access log.
pub const NO_ACCESS_LOGS: &str = "No recent access logs available";

/// Badge colour token and label for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    /// Theme colour token.
    pub color: &'static str,
    /// Badge text.
    pub label: &'static str,
}

/// The badge style for `status`.
#[must_use]
pub fn status_style(status: Status) -> StatusStyle {
    match status {
        Status::Safe => StatusStyle {
            color: "status-safe",
            label: "Safe",
        },
        Status::Danger => StatusStyle {
            color: "status-danger",
            label: "SOS Alert",
        },
        Status::Warning => StatusStyle {
            color: "status-warning",
            label: "Restricted Zone",
        },
    }
}

/// The map overlay banner for `status`. Safe tourists get none.
#[must_use]
pub fn status_overlay(status: Status) -> Option<&'static str> {
    match status {
        Status::Safe => None,
        Status::Danger => Some("SOS ALERT ACTIVE"),
        Status::Warning => Some("RESTRICTED ZONE DETECTED"),
    }
}

/// Avatar fallback: the first letter of each word of the name.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

struct Badge(Status);

impl Display for Badge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let style = status_style(self.0);
        write!(f, "[{}]", style.label)
    }
}

/// Lines of the access log panel; the sentinel when there are no entries.
#[must_use]
pub fn access_log_lines(entries: &[AccessLogEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec![NO_ACCESS_LOGS.to_string()];
    }
    entries
        .iter()
        .map(|log| {
            format!(
                "{} ({}) {} - {} @ {}",
                log.officer_name, log.officer_id, log.timestamp, log.action, log.location
            )
        })
        .collect()
}

/// Page header.
#[derive(Debug)]
pub struct HeaderView<'a>(pub &'a OfficerConfig);

impl Display for HeaderView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Police Dashboard - Tourist Safety Monitoring System")?;
        write!(f, "{} ({}) | Tourist Monitor | System Active", self.0.name, self.0.id)
    }
}

/// Tourist profile panel.
#[derive(Debug)]
pub struct ProfileView<'a>(pub &'a TouristRecord);

impl Display for ProfileView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let t = self.0;
        writeln!(f, "== Tourist Profile {}", Badge(t.status))?;
        writeln!(f, "({}) {}", initials(&t.name), t.name)?;
        writeln!(f, "Age: {}  Gender: {}", t.age, t.gender)?;
        writeln!(f, "-- Contact Details")?;
        writeln!(f, "Mobile: {}", t.mobile_number)?;
        writeln!(
            f,
            "Emergency Contact: {} {}",
            t.emergency_contact.name, t.emergency_contact.number
        )?;
        writeln!(f, "-- ID Verification")?;
        writeln!(f, "ID Type: {}", t.id_proof_type)?;
        writeln!(f, "ID Number: {}", t.id_proof_number)?;
        writeln!(f, "QR Code ID: {}", t.qr_code_id)?;
        writeln!(f, "-- Planned Itinerary")?;
        for item in &t.itinerary {
            writeln!(f, "* {item}")?;
        }
        writeln!(f, "-- Current Location")?;
        writeln!(f, "Address: {}", t.last_location.address)?;
        writeln!(f, "Coordinates: {}", Coordinates(&t.last_location))?;
        writeln!(f, "Last Updated: {}", t.last_location.timestamp)?;
        writeln!(f, "-- Integrity Tag")?;
        write!(f, "{}", t.integrity_tag)
    }
}

struct Coordinates<'a>(&'a Location);

impl Display for Coordinates<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.0.lat, self.0.lng)
    }
}

/// Live location panel.
#[derive(Debug)]
pub struct LocationView<'a> {
    /// Identity shown on the map marker.
    pub tourist_id: &'a str,
    /// Position to show.
    pub location: &'a Location,
    /// Status driving the badge and overlay.
    pub status: Status,
}

impl<'a> LocationView<'a> {
    /// Location panel for a record.
    #[must_use]
    pub fn of(record: &'a TouristRecord) -> Self {
        Self {
            tourist_id: &record.id,
            location: &record.last_location,
            status: record.status,
        }
    }
}

impl Display for LocationView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Live Location {}", Badge(self.status))?;
        if let Some(overlay) = status_overlay(self.status) {
            writeln!(f, "!! {overlay}")?;
        }
        writeln!(f, "Marker: {}", self.tourist_id)?;
        writeln!(f, "Latitude: {:.6}", self.location.lat)?;
        writeln!(f, "Longitude: {:.6}", self.location.lng)?;
        writeln!(f, "Address: {}", self.location.address)?;
        write!(f, "Last Updated: {}", self.location.timestamp)
    }
}

/// Operator action panel with the access log.
#[derive(Debug)]
pub struct ActionPanelView<'a> {
    /// Pending-state tracker.
    pub panel: &'a ActionPanel,
    /// Current status.
    pub status: Status,
    /// Access log to list.
    pub access_logs: &'a [AccessLogEntry],
}

impl Display for ActionPanelView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "== System Status {}", Badge(self.status))?;
        writeln!(f, "-- Police Actions")?;
        for action in OperatorAction::ALL {
            let marker = if self.panel.is_enabled(action, self.status) {
                " "
            } else {
                "x"
            };
            writeln!(
                f,
                "[{marker}] {:<16} {}",
                action.to_string(),
                self.panel.button_label(action)
            )?;
        }
        write!(f, "-- Recent Access Logs")?;
        for line in access_log_lines(self.access_logs) {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Scanner panel shown while acquiring.
#[derive(Debug)]
pub struct ScannerView<'a>(pub &'a Dashboard);

impl Display for ScannerView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let dashboard = self.0;
        let acquisition = dashboard.acquisition();
        writeln!(f, "== QR Code Scanner ({})", acquisition.mode)?;
        if dashboard.is_scan_pending() {
            write!(f, "Resolving scanned code...")?;
        } else {
            match (acquisition.mode, acquisition.active) {
                (AcquisitionMode::Camera, true) => write!(f, "Scanning... (stop to cancel)")?,
                (AcquisitionMode::Camera, false) => {
                    write!(f, "Start scanning to read tourist QR codes")?;
                }
                (AcquisitionMode::File, _) => write!(f, "Choose an image containing a QR code")?,
            }
        }
        if let Some(error) = dashboard.error() {
            write!(f, "\n!! {error}")?;
        }
        Ok(())
    }
}

/// Render the whole dashboard for the current phase.
#[must_use]
pub fn render_dashboard(dashboard: &Dashboard, panel: &ActionPanel, officer: &OfficerConfig) -> String {
    let header = HeaderView(officer);
    match (dashboard.phase(), dashboard.record()) {
        (Phase::Reviewing, Some(record)) => format!(
            "{header}\n\n{}\n\n{}\n\n{}\n\n(new: scan new tourist)",
            ProfileView(record),
            LocationView::of(record),
            ActionPanelView {
                panel,
                status: dashboard.status(),
                access_logs: dashboard.access_logs(),
            }
        ),
        _ => format!("{header}\n\n{}", ScannerView(dashboard)),
    }
}
