//! Configuration management for tourwatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::acquisition::{CameraConstraints, FacingMode};
use crate::actions::OperatorAction;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "tourwatch";

/// Default report directory name inside the data directory.
const REPORTS_DIR_NAME: &str = "reports";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TOURWATCH_`, sections separated
///    by `__`, e.g. `TOURWATCH_LATENCY__LOOKUP_MS=0`)
/// 2. TOML config file at `~/.config/tourwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration.
    pub camera: CameraConfig,
    /// Simulated latency configuration.
    pub latency: LatencyConfig,
    /// Report output configuration.
    pub report: ReportConfig,
    /// The officer operating the dashboard.
    pub officer: OfficerConfig,
}

/// Camera-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Which camera to request.
    pub facing_mode: FacingMode,
    /// Target frame width in pixels.
    pub width: u32,
    /// Target frame height in pixels.
    pub height: u32,
    /// Delay between decode attempts in milliseconds.
    pub frame_interval_ms: u64,
}

/// Simulated round-trip latencies, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Resolving a scanned payload into a profile.
    pub lookup_ms: u64,
    /// Mark-safe action.
    pub mark_safe_ms: u64,
    /// Flag-assistance action.
    pub flag_assistance_ms: u64,
    /// Download-report action.
    pub download_report_ms: u64,
}

/// Report output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory generated reports are written to.
    /// Defaults to `~/.local/share/tourwatch/reports`
    pub output_dir: Option<PathBuf>,
}

/// The officer operating the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficerConfig {
    /// Badge number.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let constraints = CameraConstraints::default();
        Self {
            facing_mode: constraints.facing_mode,
            width: constraints.width,
            height: constraints.height,
            frame_interval_ms: 100,
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            lookup_ms: 1000,
            mark_safe_ms: 1000,
            flag_assistance_ms: 1000,
            download_report_ms: 1500,
        }
    }
}

impl Default for OfficerConfig {
    fn default() -> Self {
        Self {
            id: "P001".to_string(),
            name: "Officer Singh".to_string(),
        }
    }
}

impl CameraConfig {
    /// The constraints handed to the frame source.
    #[must_use]
    pub fn constraints(&self) -> CameraConstraints {
        CameraConstraints {
            facing_mode: self.facing_mode,
            width: self.width,
            height: self.height,
        }
    }

    /// Get the frame interval as a Duration.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl LatencyConfig {
    /// All latencies set to zero.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            lookup_ms: 0,
            mark_safe_ms: 0,
            flag_assistance_ms: 0,
            download_report_ms: 0,
        }
    }

    /// Get the scan lookup latency as a Duration.
    #[must_use]
    pub fn lookup(&self) -> Duration {
        Duration::from_millis(self.lookup_ms)
    }

    /// Get the latency of an operator action as a Duration.
    #[must_use]
    pub fn for_action(&self, action: OperatorAction) -> Duration {
        let ms = match action {
            OperatorAction::MarkSafe => self.mark_safe_ms,
            OperatorAction::FlagAssistance => self.flag_assistance_ms,
            OperatorAction::DownloadReport => self.download_report_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("TOURWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::config_validation(format!(
                "camera resolution must be non-zero (got {}x{})",
                self.camera.width, self.camera.height
            )));
        }

        if self.camera.frame_interval_ms == 0 {
            return Err(Error::config_validation(
                "frame_interval_ms must be greater than 0",
            ));
        }

        if self.officer.id.trim().is_empty() {
            return Err(Error::config_validation("officer.id must not be empty"));
        }

        Ok(())
    }

    /// Get the report directory, resolving defaults if not set.
    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.report
            .output_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(REPORTS_DIR_NAME))
    }
}
