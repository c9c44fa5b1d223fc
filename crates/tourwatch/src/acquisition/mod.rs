//! QR code acquisition.
//!
//! Scan payloads come from one of two mutually exclusive sources:
//!
//! - **Camera**: a [`FrameSource`] feeds frames to a [`CameraScanner`], which
//!   decodes them until the first QR code is found and then stops.
//!
//! - **File**: a single image chosen through a [`FilePicker`] is decoded
//!   offline by [`scan_file`]. The selection is cleared afterward whether or
//!   not a code was found.
//!
//! Both sources report through [`AcquisitionEvent`]s and emit at most one
//! event per scan.

mod camera;
pub(crate) mod decode;
mod file;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use camera::{
    CameraConstraints, CameraOutcome, CameraScanner, DirectoryFrames, FacingMode, FrameSource,
};
pub use decode::{decode_image, decode_luma};
pub use file::{scan_file, FilePicker};

/// Message shown when the camera cannot be used.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera access denied or unavailable";

/// Message shown when an image holds no readable QR code.
pub const NO_CODE_FOUND_MESSAGE: &str = "No QR code found in the image";

/// Errors that can occur while acquiring a scan payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The camera (or whatever stands in for it) could not deliver frames.
    #[error("camera unavailable: {reason}")]
    CameraUnavailable {
        /// What went wrong.
        reason: String,
    },

    /// An image was read but no QR code could be decoded from it.
    #[error("no QR code found in {source_name}")]
    NoCodeFound {
        /// The image that was scanned.
        source_name: String,
    },

    /// A camera scan was requested while one is already running.
    #[error("scanner already running")]
    AlreadyRunning,
}

impl AcquisitionError {
    /// Create a camera-unavailable error.
    #[must_use]
    pub fn camera_unavailable(reason: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a no-code-found error.
    #[must_use]
    pub fn no_code_found(source_name: impl Into<String>) -> Self {
        Self::NoCodeFound {
            source_name: source_name.into(),
        }
    }

    /// The fixed text shown to the operator for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CameraUnavailable { .. } => CAMERA_UNAVAILABLE_MESSAGE,
            Self::NoCodeFound { .. } => NO_CODE_FOUND_MESSAGE,
            Self::AlreadyRunning => "Scanner is already running",
        }
    }
}

/// Where a scan payload is acquired from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Live camera feed.
    #[default]
    Camera,
    /// A still image chosen by the operator.
    File,
}

impl std::fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::File => write!(f, "file"),
        }
    }
}

/// The result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionEvent {
    /// A QR code was decoded.
    Decoded {
        /// Which source produced it.
        mode: AcquisitionMode,
        /// The decoded text, trimmed.
        text: String,
    },
    /// Acquisition failed.
    Failed(AcquisitionError),
}

/// A handle to stop a running camera scan.
///
/// Cloneable; every clone shares the same stop signal.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the scan to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}
