// SPDX-License-Identifier: MPL-2.0

//! Capture session: the ordered frames of one document and its output name
//!
//! Frame order is insertion order and becomes page order on export. There is
//! no reordering operation; removal is by ordinal and shifts later frames down.

use crate::backends::camera::CameraFrame;
use crate::constants::naming;
use crate::errors::SessionError;
use crate::pipelines::photo::PhotoEncoder;
use chrono::NaiveDate;
use image::RgbImage;
use tracing::{debug, info};

/// One captured still, JPEG-compressed
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

impl CapturedFrame {
    /// Snapshot a live camera frame at its native resolution
    pub fn from_camera_frame(
        frame: &CameraFrame,
        encoder: &PhotoEncoder,
    ) -> Result<Self, SessionError> {
        let image = frame.to_rgb_image().ok_or_else(|| {
            SessionError::EncodingFailed(format!(
                "frame buffer too small for {}x{}",
                frame.width, frame.height
            ))
        })?;
        Self::from_rgb(&image, encoder)
    }

    /// Compress an RGB image into a frame
    pub fn from_rgb(image: &RgbImage, encoder: &PhotoEncoder) -> Result<Self, SessionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SessionError::EncodingFailed("empty image".to_string()));
        }
        let jpeg = encoder
            .encode_jpeg(image)
            .map_err(SessionError::EncodingFailed)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            jpeg,
        })
    }

    /// Wrap already-encoded JPEG bytes without validating them
    ///
    /// The bytes are decoded at export time; invalid data aborts that export.
    pub fn from_encoded(width: u32, height: u32, jpeg: Vec<u8>) -> Self {
        Self {
            width,
            height,
            jpeg,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }
}

/// In-memory session for one capture-to-export cycle
#[derive(Debug, Clone)]
pub struct CaptureSession {
    frames: Vec<CapturedFrame>,
    output_name: String,
}

impl CaptureSession {
    /// Empty session named `Report-<today>` (UTC)
    pub fn new() -> Self {
        Self::with_name(Self::default_name(
            naming::DEFAULT_PREFIX,
            chrono::Utc::now().date_naive(),
        ))
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            frames: Vec::new(),
            output_name: name.into(),
        }
    }

    /// Default output name for a session started on `date`
    pub fn default_name(prefix: &str, date: NaiveDate) -> String {
        format!("{}-{}", prefix, date.format("%Y-%m-%d"))
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Append a frame; returns the new frame count
    pub fn push(&mut self, frame: CapturedFrame) -> usize {
        self.frames.push(frame);
        self.frames.len()
    }

    /// Encode the current live frame and append it
    ///
    /// Callers only offer capture while the camera is ready. On encode failure
    /// the session is left unchanged.
    pub fn capture(
        &mut self,
        frame: &CameraFrame,
        encoder: &PhotoEncoder,
    ) -> Result<usize, SessionError> {
        let captured = CapturedFrame::from_camera_frame(frame, encoder)?;
        let count = self.push(captured);
        info!(
            count,
            width = frame.width,
            height = frame.height,
            "Frame captured"
        );
        Ok(count)
    }

    /// Remove the frame at `index`, shifting later frames down by one
    pub fn delete_frame(&mut self, index: usize) -> Result<CapturedFrame, SessionError> {
        if index >= self.frames.len() {
            return Err(SessionError::InvalidIndex {
                index,
                len: self.frames.len(),
            });
        }
        let removed = self.frames.remove(index);
        debug!(index, remaining = self.frames.len(), "Frame deleted");
        Ok(removed)
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Replace the output name; any text is accepted, blanks are resolved at export
    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into();
    }

    /// Output name as used on export: trimmed, or `fallback` when blank
    pub fn resolved_name(&self, fallback: &str) -> String {
        let trimmed = self.output_name.trim();
        if trimmed.is_empty() {
            fallback.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> CapturedFrame {
        CapturedFrame::from_encoded(4, 3, vec![tag])
    }

    fn tags(session: &CaptureSession) -> Vec<u8> {
        session.frames().iter().map(|f| f.jpeg()[0]).collect()
    }

    #[test]
    fn test_default_name_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            CaptureSession::default_name("Report", date),
            "Report-2024-03-09"
        );
        assert!(CaptureSession::new().output_name().starts_with("Report-"));
    }

    #[test]
    fn test_delete_shifts_later_frames() {
        let mut session = CaptureSession::with_name("x");
        for tag in 1..=4 {
            session.push(frame(tag));
        }

        let removed = session.delete_frame(1).unwrap();
        assert_eq!(removed.jpeg(), &[2]);
        assert_eq!(tags(&session), vec![1, 3, 4]);

        session.delete_frame(2).unwrap();
        assert_eq!(tags(&session), vec![1, 3]);
    }

    #[test]
    fn test_delete_out_of_range_is_rejected() {
        let mut session = CaptureSession::with_name("x");
        session.push(frame(1));

        assert_eq!(
            session.delete_frame(1),
            Err(SessionError::InvalidIndex { index: 1, len: 1 })
        );
        assert_eq!(tags(&session), vec![1]);

        let mut empty = CaptureSession::with_name("x");
        assert!(empty.delete_frame(0).is_err());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_interleaved_capture_and_delete_keeps_order() {
        let mut session = CaptureSession::with_name("x");
        let mut expected: Vec<u8> = Vec::new();
        let mut captures = 0;
        let mut deletions = 0;

        for tag in 0..20u8 {
            session.push(frame(tag));
            expected.push(tag);
            captures += 1;
            if tag % 3 == 2 {
                let idx = (tag as usize * 7) % session.len();
                session.delete_frame(idx).unwrap();
                expected.remove(idx);
                deletions += 1;
            }
        }

        assert_eq!(session.len(), captures - deletions);
        assert_eq!(tags(&session), expected);
    }

    #[test]
    fn test_resolved_name() {
        let mut session = CaptureSession::with_name("  Invoice 12 ");
        assert_eq!(session.resolved_name("document"), "Invoice 12");

        session.set_output_name("  ");
        assert_eq!(session.output_name(), "  ");
        assert_eq!(session.resolved_name("document"), "document");

        session.set_output_name("");
        assert_eq!(session.resolved_name("document"), "document");
    }

    #[test]
    fn test_capture_encodes_native_resolution() {
        let raw = vec![128u8; 32 * 24 * 3];
        let camera_frame = CameraFrame::from_packed(32, 24, raw);
        let mut session = CaptureSession::with_name("x");

        let count = session
            .capture(&camera_frame, &PhotoEncoder::default())
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(session.frames()[0].width(), 32);
        assert_eq!(session.frames()[0].height(), 24);
    }

    #[test]
    fn test_capture_of_truncated_frame_leaves_session_unchanged() {
        let camera_frame = CameraFrame::from_packed(32, 24, vec![0; 5]);
        let mut session = CaptureSession::with_name("x");

        assert!(matches!(
            session.capture(&camera_frame, &PhotoEncoder::default()),
            Err(SessionError::EncodingFailed(_))
        ));
        assert!(session.is_empty());
    }
}
