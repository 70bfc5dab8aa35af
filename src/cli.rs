// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning pages without the interactive view
//! - Assembling a document from existing image files

use campdf::backends::camera::{CameraStream, enumerate_cameras};
use campdf::constants::timing;
use campdf::{CaptureSession, CapturedFrame, Config, DocumentPipeline, PhotoEncoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Fresh session named from the command line or `<prefix>-<today>`
pub fn new_session(config: &Config, name: Option<String>) -> CaptureSession {
    match name {
        Some(name) => CaptureSession::with_name(name),
        None => CaptureSession::with_name(CaptureSession::default_name(
            &config.name_prefix,
            chrono::Utc::now().date_naive(),
        )),
    }
}

pub fn document_pipeline(config: &Config) -> DocumentPipeline {
    DocumentPipeline::new(
        config.page,
        config.output_dir.clone(),
        config.fallback_name.clone(),
    )
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Facing: {}", camera.facing);
        if let Some(path) = &camera.path {
            println!("      Path: {}", path);
        }
        println!();
    }

    Ok(())
}

/// Capture `count` pages `interval` apart and export them
pub fn scan(
    config: &Config,
    name: Option<String>,
    count: usize,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = CameraStream::open(config.facing)?;
    println!("Using camera: {}", stream.device_name());

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    // Wait for frames to stabilize (camera warm-up)
    stream.wait_for_frame(timing::WARMUP, timing::FIRST_FRAME_TIMEOUT)?;

    let encoder = PhotoEncoder::new(config.quality);
    let mut session = new_session(config, name);

    println!("Scanning {} page(s)... (press Ctrl+C to stop early)", count);
    for page in 0..count {
        if page > 0 && !wait_or_stop(&mut stream, interval, &stop_flag) {
            break;
        }
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }

        stream.poll_frames();
        match stream.latest_frame() {
            Some(frame) => {
                let captured = session.capture(frame, &encoder)?;
                println!("  Captured page {}/{}", captured, count);
            }
            None => warn!(page = page + 1, "No frame available, skipping"),
        }
    }

    if stop_flag.load(Ordering::SeqCst) {
        println!();
        println!("Stopping early...");
    }

    // Release the camera before writing the document
    drop(stream);
    export_session(config, &session)
}

/// Wait for `interval`, returning false if Ctrl+C was pressed meanwhile
///
/// Keeps draining the stream so the frame captured next is current.
fn wait_or_stop(stream: &mut CameraStream, interval: Duration, stop_flag: &AtomicBool) -> bool {
    let start = Instant::now();
    while start.elapsed() < interval {
        if stop_flag.load(Ordering::SeqCst) {
            return false;
        }
        stream.poll_frames();
        std::thread::sleep(Duration::from_millis(50).min(interval));
    }
    true
}

/// Build a document from existing image files, in argument order
pub fn assemble(
    config: &Config,
    name: Option<String>,
    inputs: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    if inputs.is_empty() {
        return Err("No input images given".into());
    }

    let encoder = PhotoEncoder::new(config.quality);
    let mut session = new_session(config, name);

    for path in inputs {
        let frame = load_frame(path, &encoder)?;
        info!(path = %path.display(), width = frame.width(), height = frame.height(), "Loaded page");
        session.push(frame);
    }

    export_session(config, &session)
}

fn load_frame(
    path: &Path,
    encoder: &PhotoEncoder,
) -> Result<CapturedFrame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?
        .to_rgb8();
    Ok(CapturedFrame::from_rgb(&image, encoder)?)
}

fn export_session(
    config: &Config,
    session: &CaptureSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = document_pipeline(config);

    match pipeline.export(session)? {
        Some(path) => {
            println!(
                "Document saved: {} ({} page(s))",
                path.display(),
                session.len()
            );
            if config.open_after_export
                && let Err(e) = open::that(&path)
            {
                warn!(error = %e, "Failed to open document");
            }
        }
        None => println!("Nothing captured, no document written."),
    }

    Ok(())
}
