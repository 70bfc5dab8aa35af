// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Page geometry defaults (A4 portrait, millimetres)
pub mod page {
    /// A4 page width in millimetres
    pub const A4_WIDTH_MM: f64 = 210.0;
    /// A4 page height in millimetres
    pub const A4_HEIGHT_MM: f64 = 297.0;
    /// Uniform margin on every side
    pub const MARGIN_MM: f64 = 10.0;
    /// PDF user space units per millimetre (72 pt per inch)
    pub const POINTS_PER_MM: f64 = 72.0 / 25.4;
}

/// Output file naming
pub mod naming {
    /// Prefix of the default session name (`Report-YYYY-MM-DD`)
    pub const DEFAULT_PREFIX: &str = "Report";
    /// Base name used when the output name is blank at export time
    pub const FALLBACK_NAME: &str = "document";
    /// Extension appended to every exported document
    pub const DOCUMENT_EXTENSION: &str = "pdf";
    /// Folder under the user's documents directory
    pub const DEFAULT_SAVE_FOLDER: &str = "Scans";
}

/// GStreamer pipeline tuning
pub mod pipeline {
    /// Frames buffered in the appsink before old ones are dropped
    pub const MAX_BUFFERS: u32 = 2;
    /// Capacity of the frame channel between the streaming thread and the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
    /// Device class watched by the device monitor
    pub const VIDEO_SOURCE_CLASS: &str = "Video/Source";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Seconds to wait for the pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;
    /// Seconds to wait for the pipeline to reach NULL
    pub const STOP_TIMEOUT_SECS: u64 = 2;
    /// Time given to the sensor for exposure to settle before a scan
    pub const WARMUP: Duration = Duration::from_millis(500);
    /// Maximum time a scan waits for the first frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
    /// Terminal event poll interval (~60 Hz redraw)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);
    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 120;
}
