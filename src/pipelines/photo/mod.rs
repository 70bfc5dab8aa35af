// SPDX-License-Identifier: MPL-2.0

//! Photo pipeline
//!
//! ```text
//! CameraFrame (RGB, native size) → RgbImage → JPEG bytes → CapturedFrame
//! ```

pub mod encoding;

pub use encoding::{EncodingQuality, PhotoEncoder};
