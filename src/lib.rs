// SPDX-License-Identifier: MPL-2.0

//! campdf - capture document pages with a camera and export them as a PDF
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera acquisition and live frames
//! - [`session`]: Ordered captured frames and the output name
//! - [`pipelines`]: JPEG encoding and PDF export
//! - [`config`]: User configuration handling
//! - [`storage`]: Output paths and file writing
//! - [`terminal`]: Interactive terminal session view
//!
//! # Example
//!
//! ```no_run
//! use campdf::{CaptureSession, DocumentPipeline, PageGeometry};
//!
//! let session = CaptureSession::new();
//! let pipeline = DocumentPipeline::new(PageGeometry::A4, "/tmp/scans", "document");
//! // Empty sessions export nothing
//! assert!(pipeline.export(&session).unwrap().is_none());
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod session;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use backends::camera::{CameraHandle, CameraStatus, FacingPreference};
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, ExportError, SessionError};
pub use pipelines::document::{DocumentPipeline, PageGeometry, PageLayout};
pub use pipelines::photo::{EncodingQuality, PhotoEncoder};
pub use session::{CaptureSession, CapturedFrame};
