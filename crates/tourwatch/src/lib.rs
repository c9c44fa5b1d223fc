//! `tourwatch` - Tourist safety QR scanning for police officers
//!
//! An officer scans a tourist's QR code, from a camera feed or from an image
//! file. The payload is interpreted into a [`TouristRecord`], shown together
//! with the tourist's live location, and the officer can mark the tourist
//! safe, flag them for assistance, or download a report.
//!
//! [`Dashboard`] holds the session state; [`Session`] drives it through the
//! asynchronous parts (camera, file decoding, the registry [`Gateway`]).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod actions;
pub mod cli;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod interpret;
pub mod logging;
pub mod presentation;
pub mod profile;
pub mod report;
pub mod session;

pub use acquisition::{AcquisitionError, AcquisitionEvent, AcquisitionMode};
pub use actions::{ActionPanel, Notification, OperatorAction};
pub use config::Config;
pub use console::Console;
pub use dashboard::{Dashboard, Phase};
pub use error::{Error, Result};
pub use gateway::{Gateway, SimulatedGateway};
pub use interpret::{interpret, ScanPayload};
pub use logging::init_logging;
pub use profile::{AccessLogEntry, Status, TouristRecord};
pub use report::TouristReport;
pub use session::{ActionOutcome, PendingAction, Session};
