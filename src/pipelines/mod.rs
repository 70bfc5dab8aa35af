// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines from camera frame to exported document
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ CapturedFrame  │
//! │    (RGB)     │     │  - JPEG encoding  │     │  (in session)  │
//! └──────────────┘     └───────────────────┘     └────────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │   Session    │ ──▶ │ Document Pipeline │ ──▶ │    PDF File    │
//! │  (ordered)   │     │  - Page fitting   │     │                │
//! │              │     │  - PDF writing    │     │                │
//! └──────────────┘     └───────────────────┘     └────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: JPEG encoding of captured frames
//! - [`document`]: Page layout and PDF export

pub mod document;
pub mod photo;
