//! Camera-mode acquisition.
//!
//! A [`FrameSource`] stands in for the video device. The [`CameraScanner`]
//! pulls frames from it, decodes each one, and stops after the first
//! successful decode or the first device error.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::decode::decode_image;
use super::{AcquisitionError, AcquisitionEvent, AcquisitionMode, ScanHandle};

/// Which camera to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// What the scanner asks of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    /// Requested camera.
    pub facing_mode: FacingMode,
    /// Target frame width in pixels.
    pub width: u32,
    /// Target frame height in pixels.
    pub height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            width: 300,
            height: 300,
        }
    }
}

/// A source of camera frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Open the device with the requested constraints.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::CameraUnavailable`] if permission is
    /// denied or the device cannot be opened.
    async fn open(&mut self, constraints: &CameraConstraints) -> Result<(), AcquisitionError>;

    /// Fetch the next frame, or `None` once the feed has ended.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::CameraUnavailable`] on a device failure.
    async fn next_frame(&mut self) -> Result<Option<DynamicImage>, AcquisitionError>;
}

/// How a camera scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraOutcome {
    /// A code was decoded and reported.
    Decoded,
    /// The device failed and the failure was reported.
    Failed,
    /// The scan was stopped through its [`ScanHandle`].
    Stopped,
    /// The feed ended without a readable code.
    Exhausted,
}

/// Single-shot camera scanner.
#[derive(Debug)]
pub struct CameraScanner<S> {
    source: S,
    constraints: CameraConstraints,
    frame_interval: Duration,
    handle: ScanHandle,
}

impl<S: FrameSource> CameraScanner<S> {
    /// Create a scanner over `source`.
    #[must_use]
    pub fn new(source: S, constraints: CameraConstraints, frame_interval: Duration) -> Self {
        Self {
            source,
            constraints,
            frame_interval,
            handle: ScanHandle::new(),
        }
    }

    /// A handle that stops this scanner.
    #[must_use]
    pub fn handle(&self) -> ScanHandle {
        self.handle.clone()
    }

    /// Scan until the first code is decoded, the device fails, the feed
    /// ends, or the handle is stopped.
    ///
    /// At most one event is sent. After a decode or a failure the handle is
    /// left in the stopped state, so callers can treat it as "acquisition
    /// off".
    pub async fn run(mut self, tx: mpsc::Sender<AcquisitionEvent>) -> CameraOutcome {
        let description = self.source.describe();
        info!(
            source = %description,
            facing_mode = %self.constraints.facing_mode,
            width = self.constraints.width,
            height = self.constraints.height,
            "starting camera scan"
        );

        if let Err(err) = self.source.open(&self.constraints).await {
            return Self::fail(&self.handle, &tx, err).await;
        }

        let mut frames = 0u64;
        loop {
            if self.handle.should_stop() {
                debug!(frames, "camera scan stopped");
                return CameraOutcome::Stopped;
            }

            let frame = match self.source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!(frames, "camera feed ended without a code");
                    return CameraOutcome::Exhausted;
                }
                Err(err) => return Self::fail(&self.handle, &tx, err).await,
            };
            frames += 1;

            if let Some(text) = decode_frame(frame).await {
                // A stop that raced with this decode wins.
                if self.handle.should_stop() {
                    return CameraOutcome::Stopped;
                }
                self.handle.stop();
                info!(frames, "camera decoded a QR code");
                send(
                    &tx,
                    AcquisitionEvent::Decoded {
                        mode: AcquisitionMode::Camera,
                        text,
                    },
                )
                .await;
                return CameraOutcome::Decoded;
            }

            tokio::time::sleep(self.frame_interval).await;
        }
    }

    async fn fail(
        handle: &ScanHandle,
        tx: &mpsc::Sender<AcquisitionEvent>,
        err: AcquisitionError,
    ) -> CameraOutcome {
        warn!(error = %err, "camera scan failed");
        handle.stop();
        send(tx, AcquisitionEvent::Failed(err)).await;
        CameraOutcome::Failed
    }
}

async fn decode_frame(frame: DynamicImage) -> Option<String> {
    match tokio::task::spawn_blocking(move || decode_image(&frame)).await {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "frame decode task failed");
            None
        }
    }
}

async fn send(tx: &mpsc::Sender<AcquisitionEvent>, event: AcquisitionEvent) {
    if tx.send(event).await.is_err() {
        debug!("acquisition receiver dropped; event discarded");
    }
}

/// Frames read from image files in a directory, in file-name order.
///
/// Useful for replaying a capture from a device that dumps frames to disk.
/// Files that fail to load are skipped.
#[derive(Debug)]
pub struct DirectoryFrames {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl DirectoryFrames {
    /// Create a source over `dir`. Nothing is read until [`FrameSource::open`].
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: VecDeque::new(),
        }
    }

    /// The directory frames are read from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

#[async_trait]
impl FrameSource for DirectoryFrames {
    fn describe(&self) -> String {
        format!("frames in {}", self.dir.display())
    }

    async fn open(&mut self, _constraints: &CameraConstraints) -> Result<(), AcquisitionError> {
        let unavailable =
            |e: std::io::Error| AcquisitionError::camera_unavailable(format!("{}: {e}", self.dir.display()));

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut frames = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if is_frame(&path) {
                frames.push(path);
            }
        }

        if frames.is_empty() {
            return Err(AcquisitionError::camera_unavailable(format!(
                "no frames in {}",
                self.dir.display()
            )));
        }

        frames.sort();
        debug!(count = frames.len(), "frame directory opened");
        self.pending = frames.into();
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<DynamicImage>, AcquisitionError> {
        while let Some(path) = self.pending.pop_front() {
            let loaded = tokio::task::spawn_blocking({
                let path = path.clone();
                move || image::open(path)
            })
            .await;

            match loaded {
                Ok(Ok(frame)) => return Ok(Some(frame)),
                Ok(Err(e)) => warn!(path = %path.display(), error = %e, "skipping unreadable frame"),
                Err(e) => warn!(path = %path.display(), error = %e, "frame load task failed"),
            }
        }
        Ok(None)
    }
}
