// SPDX-License-Identifier: GPL-3.0-only

//! PDF document writer
//!
//! Builds the document object by object with lopdf. JPEG frames are embedded
//! as-is through `DCTDecode`, so export never re-compresses an image.

use super::layout::{PageGeometry, PageLayout};
use super::{ColorSpace, PageImage, PageSink};
use crate::constants::page::POINTS_PER_MM;
use crate::errors::ExportError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

struct PageContent {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

impl PageContent {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Paginated PDF under construction
///
/// Starts with one blank page, like a fresh sheet of paper.
pub struct PdfDocument {
    doc: Document,
    geometry: PageGeometry,
    title: String,
    pages: Vec<PageContent>,
    image_count: usize,
}

impl PdfDocument {
    pub fn new(geometry: PageGeometry, title: impl Into<String>) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            geometry,
            title: title.into(),
            pages: vec![PageContent::new()],
            image_count: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Convert a top-left millimetre rectangle to the PDF image matrix
    /// (bottom-left origin, points)
    fn image_matrix(&self, layout: &PageLayout) -> [f64; 6] {
        let bottom = self.geometry.height_mm - layout.y - layout.height;
        [
            layout.width * POINTS_PER_MM,
            0.0,
            0.0,
            layout.height * POINTS_PER_MM,
            layout.x * POINTS_PER_MM,
            bottom * POINTS_PER_MM,
        ]
    }

    /// Serialize the finished document
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let pages_id = self.doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());

        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

            let mut xobjects = lopdf::Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name, id);
            }
            let resources_id = self.doc.add_object(dictionary! {
                "XObject" => xobjects,
            });

            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        self.doc.set_object(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Count" => page_count,
                "Kids" => kids,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real((self.geometry.width_mm * POINTS_PER_MM) as f32),
                    Object::Real((self.geometry.height_mm * POINTS_PER_MM) as f32),
                ],
            },
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let producer = producer();
        let created = chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string();
        let info_id = self.doc.add_object(dictionary! {
            "Title" => text_string(&self.title),
            "Creator" => Object::string_literal(producer.as_str()),
            "Producer" => Object::string_literal(producer.as_str()),
            "CreationDate" => Object::string_literal(created),
        });
        self.doc.trailer.set("Info", info_id);

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;

        debug!(pages = page_count, size = buffer.len(), "PDF serialized");
        Ok(buffer)
    }
}

/// `campdf <version>`, matching `campdf --version`
fn producer() -> String {
    format!("campdf {}", env!("CARGO_PKG_VERSION"))
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

impl PageSink for PdfDocument {
    fn add_page(&mut self) -> Result<(), ExportError> {
        self.pages.push(PageContent::new());
        Ok(())
    }

    fn draw_image(&mut self, image: &PageImage<'_>, layout: &PageLayout) -> Result<(), ExportError> {
        let color_space = match image.color_space {
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Gray => "DeviceGray",
        };
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.to_vec(),
        )
        .with_compression(false);
        let image_id = self.doc.add_object(stream);

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let matrix = self.image_matrix(layout);

        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| ExportError::WriteFailed("document has no page".to_string()))?;
        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            matrix.iter().map(|v| Object::Real(*v as f32)).collect(),
        ));
        page.operations.push(Operation::new(
            "Do",
            vec![Object::Name(name.as_bytes().to_vec())],
        ));
        page.operations.push(Operation::new("Q", vec![]));
        page.images.push((name, image_id));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_matrix_flips_to_bottom_left() {
        let doc = PdfDocument::new(PageGeometry::A4, "t");
        let layout = PageLayout {
            x: 10.0,
            y: 77.25,
            width: 190.0,
            height: 142.5,
        };
        let m = doc.image_matrix(&layout);

        let mm = |v: f64| v * 72.0 / 25.4;
        assert!((m[0] - mm(190.0)).abs() < 1e-9);
        assert!((m[3] - mm(142.5)).abs() < 1e-9);
        assert!((m[4] - mm(10.0)).abs() < 1e-9);
        // 297 - 77.25 - 142.5 = 77.25, symmetric for a centered image
        assert!((m[5] - mm(77.25)).abs() < 1e-9);
    }

    #[test]
    fn test_non_ascii_title_is_utf16() {
        match text_string("보고서") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(bytes.len(), 2 + 3 * 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            text_string("Report"),
            Object::String(_, StringFormat::Literal)
        ));
    }

    #[test]
    fn test_info_names_producer_and_title() {
        let image = image::RgbImage::from_pixel(8, 8, image::Rgb([50, 50, 50]));
        let jpeg = crate::pipelines::photo::PhotoEncoder::default()
            .encode_jpeg(&image)
            .unwrap();
        let page = PageImage {
            jpeg: &jpeg,
            width: 8,
            height: 8,
            color_space: ColorSpace::Rgb,
        };
        let mut doc = PdfDocument::new(PageGeometry::A4, "Invoice");
        doc.draw_image(&page, &PageGeometry::A4.fit(8, 8)).unwrap();
        let bytes = doc.finish().unwrap();

        let parsed = Document::load_mem(&bytes).unwrap();
        let info_id = parsed.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = parsed.get_dictionary(info_id).unwrap();
        let expected = format!("campdf {}", env!("CARGO_PKG_VERSION"));
        assert_eq!(
            info.get(b"Producer").unwrap().as_str().unwrap(),
            expected.as_bytes()
        );
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Invoice");
    }

    #[test]
    fn test_new_document_has_initial_page() {
        let mut doc = PdfDocument::new(PageGeometry::A4, "t");
        assert_eq!(doc.page_count(), 1);
        doc.add_page().unwrap();
        assert_eq!(doc.page_count(), 2);
    }
}
