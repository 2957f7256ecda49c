// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly dispatcher — turns the final ordered page sequence into output
// file contents for the requested format. PDF output renders raster pages,
// passes imported PDF pages through, and merges; image output encodes one
// file per page.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{info, instrument};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::options::PdfMetadata;
use scanwerk_core::types::{OutputFormat, PageContent, PageSequence};

use crate::pdf::merge::merge_pages;
use crate::pdf::writer::ScanPageWriter;

/// One file produced by assembly, not yet written to disk. The pipeline owns
/// the write so encryption and overwrite policy stay in one place.
#[derive(Debug)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Everything assembly needs for one run.
pub struct AssemblyRequest<'a> {
    pub pages: &'a PageSequence,
    pub format: OutputFormat,
    pub metadata: &'a PdfMetadata,
    /// OCR language, already resolved (disable-wins applied upstream).
    pub ocr_language: Option<&'a str>,
    pub jpeg_quality: u8,
    pub output_path: &'a Path,
}

/// Assemble the page sequence into output file contents.
#[instrument(skip_all, fields(pages = request.pages.len(), format = ?request.format))]
pub fn assemble(request: &AssemblyRequest<'_>) -> Result<Vec<OutputFile>> {
    if request.pages.is_empty() {
        return Err(ScanwerkError::Assembly("no pages to assemble".into()));
    }

    let files = match request.format {
        OutputFormat::Pdf => assemble_pdf(request)?,
        OutputFormat::Jpeg | OutputFormat::Png | OutputFormat::Tiff => assemble_images(request)?,
    };

    info!(files = files.len(), "assembly complete");
    Ok(files)
}

fn assemble_pdf(request: &AssemblyRequest<'_>) -> Result<Vec<OutputFile>> {
    let ocr = OcrContext::create(request.ocr_language)?;
    let writer = ScanPageWriter::default();

    let mut parts: Vec<Vec<u8>> = Vec::with_capacity(request.pages.len());
    for page in request.pages.iter() {
        match &page.content {
            PageContent::Raster(bytes) => {
                let text = ocr.recognize(bytes)?;
                parts.push(writer.page_from_image(bytes, text.as_deref())?);
            }
            PageContent::Pdf(bytes) => parts.push(bytes.clone()),
        }
    }

    let merged = merge_pages(parts.iter().map(|p| p.as_slice()), request.metadata)?;
    Ok(vec![OutputFile {
        path: request.output_path.to_path_buf(),
        bytes: merged,
    }])
}

fn assemble_images(request: &AssemblyRequest<'_>) -> Result<Vec<OutputFile>> {
    let total = request.pages.len();
    let mut files = Vec::with_capacity(total);

    for (index, page) in request.pages.iter().enumerate() {
        let bytes = match &page.content {
            PageContent::Raster(bytes) => bytes,
            PageContent::Pdf(_) => {
                return Err(ScanwerkError::Assembly(
                    "cannot render imported PDF pages to image output; choose a .pdf output"
                        .into(),
                ));
            }
        };
        let encoded = encode_image(bytes, request.format, request.jpeg_quality)?;
        files.push(OutputFile {
            path: numbered_path(request.output_path, index + 1, total),
            bytes: encoded,
        });
    }

    Ok(files)
}

fn encode_image(bytes: &[u8], format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|err| ScanwerkError::Image(format!("failed to decode page: {err}")))?;

    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            rgb.write_with_encoder(encoder)
                .map_err(|err| ScanwerkError::Image(format!("JPEG encoding failed: {err}")))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|err| ScanwerkError::Image(format!("PNG encoding failed: {err}")))?;
        }
        OutputFormat::Tiff => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Tiff)
                .map_err(|err| ScanwerkError::Image(format!("TIFF encoding failed: {err}")))?;
        }
        OutputFormat::Pdf => unreachable!("PDF output goes through assemble_pdf"),
    }
    Ok(out)
}

/// `scan.jpg` for a single page; `scan.1.jpg`, `scan.2.jpg`, … when the run
/// produced more than one.
fn numbered_path(path: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    path.with_file_name(format!("{stem}.{index}.{ext}"))
}

// -- OCR hook -----------------------------------------------------------------

/// Feature-gated OCR wrapper so the assembly path reads the same with and
/// without the `ocr` cargo feature.
struct OcrContext {
    #[cfg(feature = "ocr")]
    engine: Option<crate::ocr::OcrEngine>,
}

impl OcrContext {
    #[cfg(feature = "ocr")]
    fn create(language: Option<&str>) -> Result<Self> {
        let engine = match language {
            Some(lang) => Some(crate::ocr::OcrEngine::for_language(lang)?),
            None => None,
        };
        Ok(Self { engine })
    }

    #[cfg(not(feature = "ocr"))]
    fn create(language: Option<&str>) -> Result<Self> {
        if let Some(lang) = language {
            tracing::warn!(
                language = lang,
                "OCR requested but scanwerk was built without the 'ocr' feature; skipping"
            );
        }
        Ok(Self {})
    }

    #[cfg(feature = "ocr")]
    fn recognize(&self, bytes: &[u8]) -> Result<Option<String>> {
        let Some(engine) = &self.engine else {
            return Ok(None);
        };
        let img = image::load_from_memory(bytes)
            .map_err(|err| ScanwerkError::Ocr(format!("failed to decode page for OCR: {err}")))?;
        engine.recognize_text(&img).map(Some)
    }

    #[cfg(not(feature = "ocr"))]
    fn recognize(&self, _bytes: &[u8]) -> Result<Option<String>> {
        Ok(None)
    }
}
