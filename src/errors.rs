// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Session editing errors
    Session(SessionError),
    /// Document export errors
    Export(ExportError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// GStreamer or pipeline construction failed
    InitializationFailed(String),
    /// Pipeline did not reach the playing state in time
    StartTimeout,
    /// No frame has arrived yet
    NoFrameAvailable,
    /// Acquisition was abandoned before it finished
    Cancelled,
}

/// Session editing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Frame index outside the current sequence
    InvalidIndex { index: usize, len: usize },
    /// Frame could not be encoded
    EncodingFailed(String),
}

/// Document export errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// A stored frame could not be decoded
    MalformedFrame { index: usize, reason: String },
    /// The PDF writer failed
    WriteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Export(e) => write!(f, "Export error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::StartTimeout => write!(f, "Camera did not start in time"),
            CameraError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CameraError::Cancelled => write!(f, "Camera acquisition cancelled"),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidIndex { index, len } => {
                write!(f, "Invalid frame index {} (session has {} frames)", index, len)
            }
            SessionError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::MalformedFrame { index, reason } => {
                write!(f, "Frame {} could not be decoded: {}", index + 1, reason)
            }
            ExportError::WriteFailed(msg) => write!(f, "Failed to write document: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for SessionError {}
impl std::error::Error for ExportError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
