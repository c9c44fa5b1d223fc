//! Operator actions and the action panel.
//!
//! The three intents an officer can trigger against the tourist under
//! review, the notifications they produce, and the panel state that decides
//! which of them are currently available.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::profile::Status;

/// An operator-triggered intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorAction {
    /// Set the tourist's status to safe.
    MarkSafe,
    /// Raise an assistance alert (status danger).
    FlagAssistance,
    /// Produce a report for the tourist.
    DownloadReport,
}

impl OperatorAction {
    /// All actions, in panel order.
    pub const ALL: [Self; 3] = [Self::MarkSafe, Self::FlagAssistance, Self::DownloadReport];

    /// Button text while idle.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MarkSafe => "Mark Tourist as Safe",
            Self::FlagAssistance => "Flag for Assistance",
            Self::DownloadReport => "Download Tourist Report",
        }
    }

    /// Button text while the action is pending.
    #[must_use]
    pub fn loading_label(self) -> &'static str {
        match self {
            Self::MarkSafe => "Updating...",
            Self::FlagAssistance => "Creating Alert...",
            Self::DownloadReport => "Generating PDF...",
        }
    }

    /// Notification shown when the action completes.
    #[must_use]
    pub fn success(self) -> Notification {
        let (title, description) = match self {
            Self::MarkSafe => (
                "Tourist Marked as Safe",
                "Status updated and logged in system.",
            ),
            Self::FlagAssistance => (
                "Assistance Alert Created",
                "Incident alert has been logged and dispatch notified.",
            ),
            Self::DownloadReport => (
                "Report Downloaded",
                "Tourist safety report has been generated and downloaded.",
            ),
        };
        Notification {
            title,
            description,
            variant: NotificationVariant::Default,
        }
    }

    /// Notification shown when the action fails.
    #[must_use]
    pub fn failure(self) -> Notification {
        let description = match self {
            Self::MarkSafe => "Failed to update status. Please try again.",
            Self::FlagAssistance => "Failed to create alert. Please try again.",
            Self::DownloadReport => "Failed to generate report. Please try again.",
        };
        Notification {
            title: "Error",
            description,
            variant: NotificationVariant::Destructive,
        }
    }
}

impl std::fmt::Display for OperatorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkSafe => write!(f, "mark-safe"),
            Self::FlagAssistance => write!(f, "flag-assistance"),
            Self::DownloadReport => write!(f, "download-report"),
        }
    }
}

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationVariant {
    /// Informational.
    #[default]
    Default,
    /// Something went wrong.
    Destructive,
}

/// A dismissable message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline.
    pub title: &'static str,
    /// One-sentence detail.
    pub description: &'static str,
    /// Visual weight.
    pub variant: NotificationVariant,
}

impl Notification {
    /// Check if this notification reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = match self.variant {
            NotificationVariant::Default => "ok",
            NotificationVariant::Destructive => "!!",
        };
        write!(f, "[{marker}] {}: {}", self.title, self.description)
    }
}

/// Tracks which actions are in flight.
///
/// Each action is disabled only while its own request is pending; the
/// others stay available.
#[derive(Debug, Default)]
pub struct ActionPanel {
    pending: HashSet<OperatorAction>,
}

impl ActionPanel {
    /// Create a panel with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `action` is in flight.
    #[must_use]
    pub fn is_pending(&self, action: OperatorAction) -> bool {
        self.pending.contains(&action)
    }

    /// Check if `action` can be triggered given the current status.
    ///
    /// Mark-safe is unavailable while the tourist is already safe.
    #[must_use]
    pub fn is_enabled(&self, action: OperatorAction, status: Status) -> bool {
        if self.is_pending(action) {
            return false;
        }
        !(action == OperatorAction::MarkSafe && status == Status::Safe)
    }

    /// Mark `action` as in flight. Returns `false` (and changes nothing) if
    /// the action is not currently enabled.
    pub fn begin(&mut self, action: OperatorAction, status: Status) -> bool {
        if !self.is_enabled(action, status) {
            return false;
        }
        self.pending.insert(action)
    }

    /// Mark `action` as settled.
    pub fn finish(&mut self, action: OperatorAction) {
        self.pending.remove(&action);
    }

    /// Button text for `action` in its current state.
    #[must_use]
    pub fn button_label(&self, action: OperatorAction) -> &'static str {
        if self.is_pending(action) {
            action.loading_label()
        } else {
            action.label()
        }
    }
}
