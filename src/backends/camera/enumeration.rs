// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor
//!
//! The monitor aggregates every installed device provider (PipeWire, libcamera,
//! V4L2), so the same code path finds phone sensors with location metadata and
//! plain USB webcams without it.

use super::types::{CameraDevice, CameraFacing};
use crate::constants::pipeline;
use crate::errors::CameraError;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Property keys that carry the sensor location, in lookup order
const LOCATION_KEYS: [&str; 3] = [
    "api.libcamera.location",
    "camera.location",
    "device.location",
];

/// Property keys that carry a device node path, in lookup order
const PATH_KEYS: [&str; 4] = ["object.path", "api.v4l2.path", "device.path", "device.name"];

/// Enumerate video sources known to GStreamer
pub fn enumerate_cameras() -> Result<Vec<CameraDevice>, CameraError> {
    gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    if monitor
        .add_filter(Some(pipeline::VIDEO_SOURCE_CLASS), None)
        .is_none()
    {
        warn!("Device monitor rejected the video source filter");
    }

    monitor
        .start()
        .map_err(|e| CameraError::InitializationFailed(format!("Device monitor: {}", e)))?;
    let devices = monitor.devices();
    monitor.stop();

    let cameras: Vec<CameraDevice> = devices
        .into_iter()
        .map(|device| {
            let name = device.display_name().to_string();
            let properties = device.properties();
            let location = properties
                .as_ref()
                .and_then(|props| first_string(props, &LOCATION_KEYS));
            let path = properties
                .as_ref()
                .and_then(|props| first_string(props, &PATH_KEYS));
            let facing = location
                .as_deref()
                .map(CameraFacing::from_location)
                .unwrap_or_default();

            debug!(name = %name, ?location, ?path, %facing, "Found video source");
            CameraDevice {
                name,
                facing,
                path,
                device,
            }
        })
        .collect();

    info!(count = cameras.len(), "Cameras enumerated");
    Ok(cameras)
}

fn first_string(props: &gstreamer::StructureRef, keys: &[&str]) -> Option<String> {
    first_non_empty(keys, |key| props.get::<String>(key).ok())
}

/// First key, in order, whose value is present and not blank
fn first_non_empty(keys: &[&str], lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    keys.iter()
        .find_map(|key| lookup(*key).filter(|value| !value.trim().is_empty()))
}
