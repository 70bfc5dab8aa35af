// SPDX-License-Identifier: MPL-2.0

//! Document export pipeline
//!
//! ```text
//! CaptureSession → decode check → PageGeometry::fit → PageSink → bytes → disk
//! ```
//!
//! The whole document is built in memory first. A frame that fails to decode
//! aborts the export before anything touches the filesystem, and the session
//! is only ever borrowed immutably.

pub mod layout;
pub mod pdf;

pub use layout::{PageGeometry, PageLayout};
pub use pdf::PdfDocument;

use crate::errors::{AppResult, ExportError};
use crate::session::{CaptureSession, CapturedFrame};
use crate::storage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Color model of an embedded JPEG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Gray,
}

/// A decoded-and-verified frame ready to be placed on a page
#[derive(Debug, Clone, Copy)]
pub struct PageImage<'a> {
    pub jpeg: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl<'a> PageImage<'a> {
    /// Decode the frame fully to make sure it is a usable JPEG
    pub fn decode(index: usize, frame: &'a CapturedFrame) -> Result<Self, ExportError> {
        let decoded =
            image::load_from_memory_with_format(frame.jpeg(), image::ImageFormat::Jpeg).map_err(
                |e| ExportError::MalformedFrame {
                    index,
                    reason: e.to_string(),
                },
            )?;

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ExportError::MalformedFrame {
                index,
                reason: "zero-sized image".to_string(),
            });
        }

        let color_space = if decoded.color().channel_count() == 1 {
            ColorSpace::Gray
        } else {
            ColorSpace::Rgb
        };

        Ok(Self {
            jpeg: frame.jpeg(),
            width: decoded.width(),
            height: decoded.height(),
            color_space,
        })
    }
}

/// Document writer seam
///
/// A sink starts out with one empty page. `add_page` appends another and
/// makes it current; `draw_image` draws onto the current page.
pub trait PageSink {
    fn add_page(&mut self) -> Result<(), ExportError>;

    fn draw_image(&mut self, image: &PageImage<'_>, layout: &PageLayout) -> Result<(), ExportError>;
}

/// Place every frame on its own page, in session order
///
/// The first frame goes on the sink's initial page; each later frame gets a
/// fresh page. Returns the number of pages drawn.
pub fn compose<S: PageSink>(
    frames: &[CapturedFrame],
    geometry: &PageGeometry,
    sink: &mut S,
) -> Result<usize, ExportError> {
    for (index, frame) in frames.iter().enumerate() {
        let image = PageImage::decode(index, frame)?;
        let layout = geometry.fit(image.width, image.height);

        if index > 0 {
            sink.add_page()?;
        }
        sink.draw_image(&image, &layout)?;

        debug!(
            page = index + 1,
            x = layout.x,
            y = layout.y,
            width = layout.width,
            height = layout.height,
            "Frame placed"
        );
    }
    Ok(frames.len())
}

/// Render a session into PDF bytes; `None` for an empty session
pub fn render_pdf(
    session: &CaptureSession,
    geometry: &PageGeometry,
    title: &str,
) -> Result<Option<Vec<u8>>, ExportError> {
    if session.is_empty() {
        return Ok(None);
    }

    let mut document = PdfDocument::new(*geometry, title);
    compose(session.frames(), geometry, &mut document)?;
    document.finish().map(Some)
}

/// Export settings
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    geometry: PageGeometry,
    output_dir: PathBuf,
    fallback_name: String,
}

impl DocumentPipeline {
    pub fn new(
        geometry: PageGeometry,
        output_dir: impl Into<PathBuf>,
        fallback_name: impl Into<String>,
    ) -> Self {
        Self {
            geometry,
            output_dir: output_dir.into(),
            fallback_name: fallback_name.into(),
        }
    }

    /// Path the session would be written to
    pub fn target_path(&self, session: &CaptureSession) -> PathBuf {
        let name = session.resolved_name(&self.fallback_name);
        storage::document_path(&self.output_dir, &name, &self.fallback_name)
    }

    /// Export the session as a PDF
    ///
    /// Returns `Ok(None)` without producing anything when the session is empty.
    pub fn export(&self, session: &CaptureSession) -> AppResult<Option<PathBuf>> {
        if session.is_empty() {
            warn!("Export requested for an empty session, nothing to do");
            return Ok(None);
        }

        let title = session.resolved_name(&self.fallback_name);
        let bytes = match render_pdf(session, &self.geometry, &title)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let path = self.target_path(session);
        storage::write_document(&path, &bytes)?;

        info!(
            pages = session.len(),
            size = bytes.len(),
            path = %path.display(),
            "Document exported"
        );
        Ok(Some(path))
    }
}
