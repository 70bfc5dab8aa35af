// SPDX-License-Identifier: MPL-2.0

//! Hardware access
//!
//! - [`camera`]: Camera enumeration, acquisition and frame streaming via GStreamer

pub mod camera;
