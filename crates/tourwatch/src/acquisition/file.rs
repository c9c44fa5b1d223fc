//! File-mode acquisition: decode a single operator-chosen image.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::decode::decode_image;
use super::{AcquisitionError, AcquisitionEvent, AcquisitionMode};

/// Holds the image the operator has chosen for the next file scan.
///
/// Scanning always consumes the selection, so choosing the same file again
/// triggers a fresh decode.
#[derive(Debug, Default)]
pub struct FilePicker {
    selection: Option<PathBuf>,
}

impl FilePicker {
    /// Create an empty picker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose an image, replacing any previous choice.
    pub fn choose(&mut self, path: impl Into<PathBuf>) {
        self.selection = Some(path.into());
    }

    /// The currently chosen image, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    fn take(&mut self) -> Option<PathBuf> {
        self.selection.take()
    }
}

/// Decode the picker's current selection.
///
/// Returns `None` if nothing is selected. Otherwise returns exactly one
/// event: the decoded text, or [`AcquisitionError::NoCodeFound`] when the
/// image cannot be read or holds no code. The selection is cleared in
/// every case.
pub async fn scan_file(picker: &mut FilePicker) -> Option<AcquisitionEvent> {
    let path = picker.take()?;
    let source_name = path.display().to_string();
    debug!(path = %source_name, "decoding image");

    let decoded = tokio::task::spawn_blocking(move || decode_path(&path)).await;

    let event = match decoded {
        Ok(Some(text)) => AcquisitionEvent::Decoded {
            mode: AcquisitionMode::File,
            text,
        },
        Ok(None) => AcquisitionEvent::Failed(AcquisitionError::no_code_found(source_name)),
        Err(e) => {
            warn!(error = %e, "image decode task failed");
            AcquisitionEvent::Failed(AcquisitionError::no_code_found(source_name))
        }
    };
    Some(event)
}

fn decode_path(path: &Path) -> Option<String> {
    match image::open(path) {
        Ok(image) => decode_image(&image),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read image");
            None
        }
    }
}
