// SPDX-License-Identifier: MPL-2.0

//! Integration tests for session editing

use campdf::{CaptureSession, CapturedFrame, SessionError};

fn frame(tag: u8) -> CapturedFrame {
    CapturedFrame::from_encoded(1, 1, vec![tag])
}

#[test]
fn test_length_tracks_captures_minus_deletions() {
    let mut session = CaptureSession::with_name("x");
    let mut model: Vec<u8> = Vec::new();

    // Deterministic mix of appends and removals
    let mut seed: u32 = 7;
    for tag in 0..60u8 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        if seed % 4 == 0 && !model.is_empty() {
            let index = (seed as usize / 4) % model.len();
            session.delete_frame(index).unwrap();
            model.remove(index);
        } else {
            session.push(frame(tag));
            model.push(tag);
        }
    }

    let tags: Vec<u8> = session.frames().iter().map(|f| f.jpeg()[0]).collect();
    assert_eq!(tags, model);
    assert_eq!(session.len(), model.len());
}

#[test]
fn test_out_of_range_delete_leaves_session_unchanged() {
    let mut session = CaptureSession::with_name("x");
    session.push(frame(1));
    session.push(frame(2));

    let err = session.delete_frame(5).unwrap_err();
    assert_eq!(err, SessionError::InvalidIndex { index: 5, len: 2 });
    assert_eq!(session.len(), 2);
}

#[test]
fn test_default_name_is_dated_report() {
    let session = CaptureSession::new();
    let name = session.output_name();
    assert!(name.starts_with("Report-"));
    // Report-YYYY-MM-DD
    assert_eq!(name.len(), "Report-".len() + 10);
}
