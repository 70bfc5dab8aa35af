// SPDX-License-Identifier: MPL-2.0

//! Integration tests for document export

use campdf::{
    AppError, CaptureSession, CapturedFrame, DocumentPipeline, ExportError, PageGeometry,
    PhotoEncoder,
};
use image::{Rgb, RgbImage};

/// Solid-color page with a distinct size so pages can be told apart
fn page(width: u32, height: u32, shade: u8) -> CapturedFrame {
    let image = RgbImage::from_pixel(width, height, Rgb([shade, shade, shade]));
    CapturedFrame::from_rgb(&image, &PhotoEncoder::default()).unwrap()
}

/// Pixel sizes of the embedded images, in page order
fn page_image_sizes(bytes: &[u8]) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_dictionary(*page_id).unwrap();
            let (_, resources) = doc.dereference(page.get(b"Resources").unwrap()).unwrap();
            let xobjects = resources
                .as_dict()
                .unwrap()
                .get(b"XObject")
                .unwrap()
                .as_dict()
                .unwrap();
            assert_eq!(xobjects.len(), 1, "one image per page");

            let (_, reference) = xobjects.iter().next().unwrap();
            let image = doc
                .get_object(reference.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
            (
                image.dict.get(b"Width").unwrap().as_i64().unwrap(),
                image.dict.get(b"Height").unwrap().as_i64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_export_writes_one_page_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DocumentPipeline::new(PageGeometry::A4, dir.path(), "document");

    let mut session = CaptureSession::with_name("Report-2024-05-01");
    session.push(page(64, 48, 10));
    session.push(page(48, 64, 120));
    session.push(page(50, 50, 240));

    let path = pipeline.export(&session).unwrap().unwrap();
    assert_eq!(path, dir.path().join("Report-2024-05-01.pdf"));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(page_image_sizes(&bytes), vec![(64, 48), (48, 64), (50, 50)]);
}

#[test]
fn test_deleted_frame_is_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DocumentPipeline::new(PageGeometry::A4, dir.path(), "document");

    let mut session = CaptureSession::with_name("scan");
    session.push(page(30, 20, 10));
    session.push(page(40, 20, 20));
    session.push(page(50, 20, 30));
    session.push(page(60, 20, 40));
    session.delete_frame(1).unwrap();

    let path = pipeline.export(&session).unwrap().unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        page_image_sizes(&bytes),
        vec![(30, 20), (50, 20), (60, 20)]
    );
}

#[test]
fn test_blank_name_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DocumentPipeline::new(PageGeometry::A4, dir.path(), "document");

    let mut session = CaptureSession::with_name("  ");
    session.push(page(16, 16, 90));

    let path = pipeline.export(&session).unwrap().unwrap();
    assert_eq!(path, dir.path().join("document.pdf"));
    assert!(path.exists());
}

#[test]
fn test_empty_session_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let pipeline = DocumentPipeline::new(PageGeometry::A4, &out, "document");

    let session = CaptureSession::with_name("empty");
    assert!(pipeline.export(&session).unwrap().is_none());
    assert!(!out.exists());
}

#[test]
fn test_malformed_frame_aborts_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DocumentPipeline::new(PageGeometry::A4, dir.path(), "document");

    let mut session = CaptureSession::with_name("broken");
    session.push(page(16, 16, 90));
    session.push(CapturedFrame::from_encoded(16, 16, b"not a jpeg".to_vec()));

    let err = pipeline.export(&session).unwrap_err();
    assert!(matches!(
        err,
        AppError::Export(ExportError::MalformedFrame { index: 1, .. })
    ));
    assert!(!pipeline.target_path(&session).exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a").join("b");
    let pipeline = DocumentPipeline::new(PageGeometry::A4, &out, "document");

    let mut session = CaptureSession::with_name("nested");
    session.push(page(16, 16, 90));

    let path = pipeline.export(&session).unwrap().unwrap();
    assert_eq!(path.parent().unwrap(), out.as_path());
}

#[test]
fn test_name_cannot_escape_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DocumentPipeline::new(PageGeometry::A4, dir.path(), "document");

    let mut session = CaptureSession::with_name("../outside");
    session.push(page(16, 16, 90));

    let path = pipeline.export(&session).unwrap().unwrap();
    assert_eq!(path.parent().unwrap(), dir.path());
}
