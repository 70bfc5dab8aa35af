// SPDX-License-Identifier: MPL-2.0

//! GStreamer preview pipeline for camera capture
//!
//! ```text
//! device source → videoconvert → appsink (RGB, native resolution)
//! ```
//!
//! Frames are pushed from the streaming thread into a bounded channel; when the
//! consumer falls behind, new frames are dropped instead of blocking the camera.

use super::types::{CameraDevice, CameraFrame};
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use futures::channel::mpsc;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Running camera pipeline
///
/// Owns the camera device for as long as it lives. Dropping it moves the
/// pipeline to `Null`, which stops every track and releases the hardware.
pub struct CameraPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl CameraPipeline {
    /// Build and start a pipeline for `device`, delivering frames to `frame_sender`
    pub fn new(
        device: &CameraDevice,
        mut frame_sender: mpsc::Sender<CameraFrame>,
    ) -> Result<Self, CameraError> {
        info!(device = %device.name, facing = %device.facing, "Creating camera pipeline");

        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let source = device
            .device
            .create_element(Some("camera_source"))
            .map_err(|e| {
                CameraError::InitializationFailed(format!("Failed to create source: {}", e))
            })?;

        let videoconvert = gstreamer::ElementFactory::make("videoconvert")
            .name("camera_convert")
            .build()
            .map_err(|e| {
                CameraError::InitializationFailed(format!("Failed to create videoconvert: {}", e))
            })?;

        let caps = gstreamer_video::VideoCapsBuilder::new()
            .format(gstreamer_video::VideoFormat::Rgb)
            .build();
        let appsink = AppSink::builder()
            .name("sink")
            .caps(&caps)
            .max_buffers(pipeline::MAX_BUFFERS)
            .drop(true)
            .sync(false)
            .build();

        let gst_pipeline = gstreamer::Pipeline::new();
        gst_pipeline
            .add_many([&source, &videoconvert, appsink.upcast_ref()])
            .map_err(|e| {
                CameraError::InitializationFailed(format!("Failed to add elements: {}", e))
            })?;
        gstreamer::Element::link_many([&source, &videoconvert, appsink.upcast_ref()]).map_err(
            |e| CameraError::InitializationFailed(format!("Failed to link elements: {}", e)),
        )?;

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        stride: video_info.stride()[0] as u32,
                    };

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            stride = frame.stride,
                            "Frame received"
                        );
                    }

                    deliver_frame(&mut frame_sender, frame)
                })
                .build(),
        );

        // From here on Drop takes care of releasing the device on every error path
        let camera = Self {
            pipeline: gst_pipeline,
            appsink,
        };

        camera
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|_| CameraError::InitializationFailed(camera.bus_error_reason()))?;

        let (result, state, pending) = camera.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");

        if result.is_err() {
            return Err(CameraError::InitializationFailed(camera.bus_error_reason()));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Pipeline did not reach PLAYING");
            return Err(CameraError::StartTimeout);
        }

        info!("Camera pipeline running");
        Ok(camera)
    }

    /// Pull the first error posted on the bus, for a human-readable status
    fn bus_error_reason(&self) -> String {
        self.pipeline
            .bus()
            .and_then(|bus| bus.pop_filtered(&[gstreamer::MessageType::Error]))
            .and_then(|msg| match msg.view() {
                gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "Failed to start pipeline".to_string())
    }
}

/// Hand a frame to the consumer, dropping it when the channel is full
///
/// Always sends through the one sender owned by the streaming callback: every
/// `mpsc::Sender` clone carries its own guaranteed slot, so sending through
/// fresh clones would let the queue grow without limit.
fn deliver_frame(
    sender: &mut mpsc::Sender<CameraFrame>,
    frame: CameraFrame,
) -> Result<gstreamer::FlowSuccess, gstreamer::FlowError> {
    match sender.try_send(frame) {
        Ok(()) => Ok(gstreamer::FlowSuccess::Ok),
        Err(e) if e.is_disconnected() => Err(gstreamer::FlowError::Eos),
        // Channel full, consumer will pick up a later frame
        Err(_) => Ok(gstreamer::FlowSuccess::Ok),
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        debug!("Releasing camera pipeline");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!(?e, "Failed to set pipeline to Null on drop");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Camera released"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> CameraFrame {
        CameraFrame::from_packed(2, 2, vec![0; 12])
    }

    #[test]
    fn test_slow_consumer_keeps_queue_bounded() {
        let (mut sender, mut receiver) = mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);

        for _ in 0..300 {
            assert_eq!(
                deliver_frame(&mut sender, frame()),
                Ok(gstreamer::FlowSuccess::Ok)
            );
        }

        let mut queued = 0;
        while receiver.try_recv().is_ok() {
            queued += 1;
        }
        // Channel capacity plus the single sender's own slot
        assert!(queued <= pipeline::FRAME_CHANNEL_CAPACITY + 1, "queued {}", queued);
        assert!(queued >= 1);
    }

    #[test]
    fn test_delivery_resumes_after_drain() {
        let (mut sender, mut receiver) = mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
        for _ in 0..50 {
            deliver_frame(&mut sender, frame()).unwrap();
        }
        while receiver.try_recv().is_ok() {}

        deliver_frame(&mut sender, frame()).unwrap();
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn test_closed_consumer_ends_stream() {
        let (mut sender, receiver) = mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
        drop(receiver);
        assert_eq!(
            deliver_frame(&mut sender, frame()),
            Err(gstreamer::FlowError::Eos)
        );
    }
}
