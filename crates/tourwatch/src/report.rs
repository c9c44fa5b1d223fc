//! Tourist safety reports.
//!
//! A report is a JSON snapshot of the tourist under review together with
//! the access log. PDF rendering is not implemented.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gateway::ActionError;
use crate::profile::{AccessLogEntry, Status, TouristRecord};

/// Snapshot produced by the download-report action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouristReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Dashboard status at generation time.
    pub status: Status,
    /// The tourist under review.
    pub tourist: TouristRecord,
    /// Access log at generation time.
    pub access_logs: Vec<AccessLogEntry>,
}

impl TouristReport {
    /// File name for this report: the tourist id with anything outside
    /// `[A-Za-z0-9_-]` replaced, followed by the generation time.
    #[must_use]
    pub fn file_name(&self) -> String {
        let id: String = self
            .tourist
            .id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!(
            "{id}-{}.json",
            self.generated_at.format("%Y%m%dT%H%M%SZ")
        )
    }

    /// Write the report as pretty JSON into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::ReportWrite`] if the directory or file cannot
    /// be written.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, ActionError> {
        let path = dir.join(self.file_name());
        let body = serde_json::to_vec_pretty(self)?;

        let write_err = |source: std::io::Error| ActionError::ReportWrite {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        tokio::fs::write(&path, body).await.map_err(write_err)?;

        info!(path = %path.display(), tourist_id = %self.tourist.id, "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::mock_access_logs;
    use chrono::TimeZone;

    fn report(id: &str) -> TouristReport {
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap();
        let mut tourist = TouristRecord::baseline(generated_at);
        tourist.id = id.to_string();
        TouristReport {
            generated_at,
            status: Status::Danger,
            tourist,
            access_logs: mock_access_logs(),
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(report("T777").file_name(), "T777-20240115T143022Z.json");
    }

    #[test]
    fn test_file_name_sanitizes_identity() {
        let name = report("../etc/passwd {x}").file_name();
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
        assert!(name.starts_with("___etc_passwd__x_-"));
    }

    #[tokio::test]
    async fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("reports");

        let report = report("T777");
        let path = report.write_to(&target).await.unwrap();

        assert!(path.starts_with(&target));
        let written: TouristReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }

    #[tokio::test]
    async fn test_write_to_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = report("T1").write_to(&blocker).await.unwrap_err();
        assert!(matches!(err, ActionError::ReportWrite { .. }));
    }
}
