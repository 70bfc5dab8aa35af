// SPDX-License-Identifier: MPL-2.0

//! Camera acquisition
//!
//! ```text
//! ┌──────────────────┐  acquire()   ┌─────────────────┐
//! │   CameraHandle   │ ───────────▶ │ worker thread   │
//! │ Loading/Ready/.. │ ◀─ oneshot ─ │ CameraStream::  │
//! └────────┬─────────┘              │   open()        │
//!          │ owns                   └─────────────────┘
//!          ▼
//! ┌──────────────────┐   frames    ┌─────────────────┐
//! │   CameraStream   │ ◀── mpsc ── │ CameraPipeline  │
//! └──────────────────┘             └─────────────────┘
//! ```
//!
//! The handle is the scoped resource: the stream lives only while the handle
//! does, and a result that arrives after the handle is gone is dropped on the
//! worker thread, which releases the camera there.

pub mod enumeration;
pub mod pipeline;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use pipeline::CameraPipeline;
pub use types::*;

use crate::constants::pipeline as pipeline_consts;
use crate::errors::CameraError;
use futures::channel::{mpsc, oneshot};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Camera state as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraStatus {
    /// Acquisition in flight
    Loading,
    /// Live frames are available
    Ready,
    /// Acquisition failed; the reason replaces the preview
    Unavailable(String),
}

impl CameraStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CameraStatus::Ready)
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraStatus::Loading => write!(f, "Loading..."),
            CameraStatus::Ready => write!(f, "Ready"),
            CameraStatus::Unavailable(reason) => write!(f, "Error: {}", reason),
        }
    }
}

/// A live camera: the running pipeline plus the most recent frame
pub struct CameraStream {
    device_name: String,
    receiver: mpsc::Receiver<CameraFrame>,
    latest: Option<CameraFrame>,
    // Declared last so the receiver is dropped before the pipeline stops
    _pipeline: CameraPipeline,
}

impl CameraStream {
    /// Open the camera that best matches `preference` (blocking)
    pub fn open(preference: FacingPreference) -> Result<Self, CameraError> {
        let cameras = enumerate_cameras()?;
        let facings: Vec<CameraFacing> = cameras.iter().map(|c| c.facing).collect();
        let index = preference
            .pick(&facings)
            .ok_or(CameraError::NoCameraFound)?;
        let device = &cameras[index];

        info!(device = %device.name, facing = %device.facing, ?preference, "Opening camera");

        let (sender, receiver) = mpsc::channel(pipeline_consts::FRAME_CHANNEL_CAPACITY);
        let pipeline = CameraPipeline::new(device, sender)?;

        Ok(Self {
            device_name: device.name.clone(),
            receiver,
            latest: None,
            _pipeline: pipeline,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Drain pending frames, keeping only the newest. Returns true if one arrived.
    pub fn poll_frames(&mut self) -> bool {
        let mut updated = false;
        while let Ok(frame) = self.receiver.try_recv() {
            self.latest = Some(frame);
            updated = true;
        }
        updated
    }

    /// Most recent live frame
    pub fn latest_frame(&self) -> Option<&CameraFrame> {
        self.latest.as_ref()
    }

    /// Block until a frame newer than `settle` is available, or `timeout` expires
    ///
    /// Used by non-interactive capture, where the sensor needs a moment for
    /// exposure to settle after the pipeline starts.
    pub fn wait_for_frame(
        &mut self,
        settle: Duration,
        timeout: Duration,
    ) -> Result<CameraFrame, CameraError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.poll_frames() && start.elapsed() >= settle {
                break;
            }
            std::thread::sleep(Duration::from_millis(16));
        }
        self.latest.clone().ok_or(CameraError::NoFrameAvailable)
    }
}

enum HandleState {
    Acquiring(oneshot::Receiver<Result<CameraStream, CameraError>>),
    Ready(CameraStream),
    Failed(String),
    Released,
}

/// Owner of the camera for the lifetime of a view
pub struct CameraHandle {
    state: HandleState,
}

impl CameraHandle {
    /// Start acquiring a camera in the background
    pub fn acquire(preference: FacingPreference) -> Self {
        let (sender, receiver) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("camera-acquire".to_string())
            .spawn(move || {
                let result = CameraStream::open(preference);
                if let Err(e) = &result {
                    debug!(error = %e, "Acquisition finished with error");
                }
                if sender.send(result).is_err() {
                    // View already gone; the stream is dropped here, releasing the device
                    info!("Camera acquired after teardown, releasing");
                }
            });

        match spawned {
            Ok(_) => Self::from_receiver(receiver),
            Err(e) => {
                error!(error = %e, "Failed to spawn camera thread");
                Self {
                    state: HandleState::Failed(e.to_string()),
                }
            }
        }
    }

    pub(crate) fn from_receiver(
        receiver: oneshot::Receiver<Result<CameraStream, CameraError>>,
    ) -> Self {
        Self {
            state: HandleState::Acquiring(receiver),
        }
    }

    /// Advance acquisition and pull new frames. Returns true if a new frame arrived.
    pub fn poll(&mut self) -> bool {
        if let HandleState::Acquiring(receiver) = &mut self.state {
            match receiver.try_recv() {
                Ok(None) => return false,
                Ok(Some(Ok(stream))) => {
                    info!(device = %stream.device_name(), "Camera ready");
                    self.state = HandleState::Ready(stream);
                }
                Ok(Some(Err(e))) => {
                    error!(error = %e, "Camera unavailable");
                    self.state = HandleState::Failed(e.to_string());
                }
                Err(oneshot::Canceled) => {
                    self.state = HandleState::Failed(CameraError::Cancelled.to_string());
                }
            }
        }

        match &mut self.state {
            HandleState::Ready(stream) => stream.poll_frames(),
            _ => false,
        }
    }

    pub fn status(&self) -> CameraStatus {
        match &self.state {
            HandleState::Acquiring(_) => CameraStatus::Loading,
            HandleState::Ready(_) => CameraStatus::Ready,
            HandleState::Failed(reason) => CameraStatus::Unavailable(reason.clone()),
            HandleState::Released => CameraStatus::Unavailable("Camera released".to_string()),
        }
    }

    pub fn stream(&self) -> Option<&CameraStream> {
        match &self.state {
            HandleState::Ready(stream) => Some(stream),
            _ => None,
        }
    }

    /// Stop the camera. Safe to call in any state and more than once.
    pub fn release(&mut self) {
        match std::mem::replace(&mut self.state, HandleState::Released) {
            HandleState::Ready(stream) => {
                info!(device = %stream.device_name(), "Stopping camera");
                drop(stream);
            }
            HandleState::Acquiring(receiver) => {
                // Closing the receiver makes the worker drop whatever it acquires
                debug!("Abandoning in-flight camera acquisition");
                drop(receiver);
            }
            HandleState::Failed(_) | HandleState::Released => {}
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}
