// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use clap::ValueEnum;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which way a physical camera points, as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Rear camera, pointing away from the user
    Environment,
    /// Front camera, pointing at the user
    User,
    /// External (USB) camera
    External,
    /// Device did not report a location
    #[default]
    Unknown,
}

impl CameraFacing {
    /// Parse a libcamera/PipeWire location property value
    pub fn from_location(location: &str) -> Self {
        match location.trim().to_ascii_lowercase().as_str() {
            "back" | "rear" | "environment" => CameraFacing::Environment,
            "front" | "user" => CameraFacing::User,
            "external" => CameraFacing::External,
            _ => CameraFacing::Unknown,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Environment => write!(f, "rear"),
            CameraFacing::User => write!(f, "front"),
            CameraFacing::External => write!(f, "external"),
            CameraFacing::Unknown => write!(f, "unknown"),
        }
    }
}

/// Requested camera facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FacingPreference {
    /// Prefer the rear camera (document scanning)
    #[default]
    Environment,
    /// Prefer the front camera
    User,
    /// Take the first camera found
    Any,
}

impl FacingPreference {
    /// Pick the device index that best matches this preference
    ///
    /// A device with the requested facing wins; otherwise the first device is
    /// used so that laptops and USB webcams without location metadata still work.
    pub fn pick(&self, facings: &[CameraFacing]) -> Option<usize> {
        if facings.is_empty() {
            return None;
        }
        let wanted = match self {
            FacingPreference::Environment => CameraFacing::Environment,
            FacingPreference::User => CameraFacing::User,
            FacingPreference::Any => return Some(0),
        };
        Some(facings.iter().position(|f| *f == wanted).unwrap_or(0))
    }
}

/// Represents a video source discovered by the device monitor
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub facing: CameraFacing,
    /// Underlying device node (e.g. `/dev/video0`), when the provider reports one
    pub path: Option<String>,
    pub(crate) device: gstreamer::Device,
}

/// Bytes per pixel of the RGB layout the appsink negotiates
const RGB_BYTES_PER_PIXEL: u32 = 3;

/// A single RGB frame delivered by the camera pipeline at native resolution
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
}

impl CameraFrame {
    /// Build a tightly packed frame from raw RGB pixels
    pub fn from_packed(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * RGB_BYTES_PER_PIXEL,
            data: Arc::from(data),
        }
    }

    /// Sample one pixel, clamping coordinates to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * RGB_BYTES_PER_PIXEL) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }

    /// Copy the frame into a packed RGB image, dropping stride padding
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let row_len = (self.width * RGB_BYTES_PER_PIXEL) as usize;
        let mut rgb = Vec::with_capacity(row_len * self.height as usize);

        for row in 0..self.height as usize {
            let start = row * self.stride as usize;
            rgb.extend_from_slice(self.data.get(start..start + row_len)?);
        }

        RgbImage::from_raw(self.width, self.height, rgb)
    }
}
