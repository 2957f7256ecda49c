// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan-page PDF writer using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised
// via `PdfDocument::save()`. Each scanned page becomes a standalone
// single-page PDF sized to the scan, ready for the lopdf merge stage.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage as PdfRawImage, RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, instrument};

use scanwerk_core::error::{Result, ScanwerkError};

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Renders one raster page into a single-page PDF.
///
/// The page is sized so the image fills it edge to edge at the configured
/// DPI. When recognised text is supplied it is written first, so the image
/// paints over it: extractable by text tools, invisible on the page.
pub struct ScanPageWriter {
    /// Resolution the scan is assumed to have been captured at.
    dpi: f32,
}

impl ScanPageWriter {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    /// Build the single-page PDF for one scanned or imported raster image.
    #[instrument(skip_all, fields(bytes_len = image_bytes.len(), has_text = text.is_some()))]
    pub fn page_from_image(&self, image_bytes: &[u8], text: Option<&str>) -> Result<Vec<u8>> {
        let dynamic_image = image::load_from_memory(image_bytes).map_err(|err| {
            ScanwerkError::Image(format!("failed to decode page image: {err}"))
        })?;

        let img_width = dynamic_image.width() as usize;
        let img_height = dynamic_image.height() as usize;

        let page_w = Mm(img_width as f32 / self.dpi * MM_PER_INCH);
        let page_h = Mm(img_height as f32 / self.dpi * MM_PER_INCH);

        // printpdf wants RGB8 pixel data.
        let rgb_image = dynamic_image.to_rgb8();
        let raw = PdfRawImage {
            pixels: RawImageData::U8(rgb_image.into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new("");
        let xobject_id = doc.add_image(&raw);

        let mut ops: Vec<Op> = Vec::new();

        // Text layer first — the image is painted over it afterwards.
        if let Some(text) = text {
            ops.extend(text_layer_ops(text, page_h));
        }

        ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.dpi),
                rotate: None,
            },
        });

        let page = PdfPage::new(page_w, page_h, ops);
        doc.with_pages(vec![page]);

        debug!(
            width_mm = page_w.0,
            height_mm = page_h.0,
            "scan page rendered"
        );

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

impl Default for ScanPageWriter {
    /// 300 DPI — the common flatbed/feeder capture resolution.
    fn default() -> Self {
        Self::new(300.0)
    }
}

/// Ops writing `text` line by line from the top of the page.
fn text_layer_ops(text: &str, page_h: Mm) -> Vec<Op> {
    let font_size_pt: f32 = 10.0;
    let line_height_pt: f32 = 12.0;
    let page_h_pt = page_h.into_pt().0;

    let mut ops = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let y_pt = page_h_pt - line_height_pt * (index as f32 + 1.0);
        if y_pt < 0.0 {
            break;
        }
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(0.0),
                y: Pt(y_pt),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(font_size_pt),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.to_string())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let buffer = image::GrayImage::from_pixel(width, height, image::Luma([255u8]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(buffer)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn renders_a_loadable_single_page_pdf() {
        let writer = ScanPageWriter::default();
        let pdf = writer.page_from_image(&png(300, 600), None).unwrap();
        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn text_layer_is_accepted() {
        let writer = ScanPageWriter::default();
        let pdf = writer
            .page_from_image(&png(300, 300), Some("Invoice 1234\nTotal due: 56.00"))
            .unwrap();
        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn garbage_input_is_an_image_error() {
        let writer = ScanPageWriter::default();
        assert!(matches!(
            writer.page_from_image(b"not an image", None),
            Err(ScanwerkError::Image(_))
        ));
    }
}
