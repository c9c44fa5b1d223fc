//! Error types for tourwatch.
//!
//! This module defines the crate-level error type. Acquisition and action
//! failures have their own enums next to the code that raises them and
//! convert into [`Error`] when they need to cross the library boundary.

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::actions::OperatorAction;
use crate::gateway::ActionError;

/// The main error type for tourwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Scanning Errors ===
    /// QR acquisition failed.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Scanning was requested while a tourist is under review.
    #[error("a tourist is under review; scan a new tourist first")]
    ReviewInProgress,

    /// An operation needs a scanned tourist but none is active.
    #[error("no tourist is currently under review")]
    NoActiveTourist,

    // === Action Errors ===
    /// The action is disabled or already pending.
    #[error("{action} is not available")]
    ActionUnavailable {
        /// The refused action.
        action: OperatorAction,
    },

    /// An operator action failed.
    #[error(transparent)]
    Action(#[from] ActionError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for tourwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// The message an operator should see for this error, if it has one.
    ///
    /// Acquisition failures carry fixed operator-facing text; everything
    /// else falls back to its display form.
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::Acquisition(err) => err.user_message().to_string(),
            other => other.to_string(),
        }
    }
}
