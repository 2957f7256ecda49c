// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Import resolution — externally supplied PDF and image files decoded into
// pages, in file order. Imports are validated and loaded before any
// scanning begins, so a bad path aborts the run while the device is idle.

use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{info, instrument};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::Page;

use crate::pdf::merge::split_into_pages;

/// Image extensions accepted for import.
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Resolve and decode every import path, preserving the file's internal page
/// order and the list order across files.
#[instrument(skip_all, fields(files = paths.len()))]
pub fn load_imports(paths: &[PathBuf], password: Option<&str>) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    for path in paths {
        let mut file_pages = import_file(path, password)?;
        info!(path = %path.display(), pages = file_pages.len(), "import loaded");
        pages.append(&mut file_pages);
    }
    Ok(pages)
}

fn import_file(path: &Path, password: Option<&str>) -> Result<Vec<Page>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => import_pdf(path, password),
        ext if IMAGE_EXTENSIONS.contains(&ext) => import_image(path),
        _ => Err(ScanwerkError::ImportFailed {
            path: path.to_path_buf(),
            detail: format!("unsupported file type '.{extension}'"),
        }),
    }
}

fn import_pdf(path: &Path, password: Option<&str>) -> Result<Vec<Page>> {
    let mut doc = Document::load(path).map_err(|err| ScanwerkError::ImportFailed {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;

    if doc.trailer.get(b"Encrypt").is_ok() {
        let password = password.ok_or_else(|| ScanwerkError::ImportPassword {
            path: path.to_path_buf(),
        })?;
        doc.decrypt(password)
            .map_err(|_| ScanwerkError::ImportPassword {
                path: path.to_path_buf(),
            })?;
    }

    let parts = split_into_pages(&doc).map_err(|err| ScanwerkError::ImportFailed {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;

    Ok(parts
        .into_iter()
        .map(|bytes| Page::imported_pdf(bytes, path.to_path_buf()))
        .collect())
}

fn import_image(path: &Path) -> Result<Vec<Page>> {
    let bytes = std::fs::read(path).map_err(|err| ScanwerkError::ImportFailed {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;

    // Decode once up front so a corrupt file fails the run before scanning.
    image::load_from_memory(&bytes).map_err(|err| ScanwerkError::ImportFailed {
        path: path.to_path_buf(),
        detail: format!("not a decodable image: {err}"),
    })?;

    Ok(vec![Page::imported_raster(bytes, path.to_path_buf())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::merge::merge_pages;
    use crate::pdf::writer::ScanPageWriter;
    use scanwerk_core::options::PdfMetadata;
    use scanwerk_core::types::PageContent;

    fn png_bytes() -> Vec<u8> {
        let buffer = image::GrayImage::from_pixel(8, 8, image::Luma([128u8]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(buffer)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn two_page_pdf() -> Vec<u8> {
        let writer = ScanPageWriter::default();
        let a = writer.page_from_image(&png_bytes(), None).unwrap();
        let b = writer.page_from_image(&png_bytes(), None).unwrap();
        merge_pages([a.as_slice(), b.as_slice()], &PdfMetadata::default()).unwrap()
    }

    #[test]
    fn missing_file_is_import_failed() {
        let paths = vec![PathBuf::from("/nonexistent/cover.pdf")];
        match load_imports(&paths, None) {
            Err(ScanwerkError::ImportFailed { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/cover.pdf"));
            }
            other => panic!("expected ImportFailed, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_extension_is_import_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, b"not a scan").unwrap();
        assert!(matches!(
            load_imports(&[path], None),
            Err(ScanwerkError::ImportFailed { .. })
        ));
    }

    #[test]
    fn output_length_is_sum_of_per_file_page_counts() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("cover.pdf");
        std::fs::write(&pdf_path, two_page_pdf()).unwrap();
        let img_path = dir.path().join("photo.png");
        std::fs::write(&img_path, png_bytes()).unwrap();

        let pages = load_imports(&[pdf_path.clone(), img_path.clone()], None).unwrap();
        assert_eq!(pages.len(), 3);

        // File-list order: PDF pages first, image last.
        assert!(matches!(pages[0].content, PageContent::Pdf(_)));
        assert!(matches!(pages[1].content, PageContent::Pdf(_)));
        assert!(matches!(pages[2].content, PageContent::Raster(_)));
    }

    #[test]
    fn corrupt_image_is_import_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG but not really").unwrap();
        assert!(matches!(
            load_imports(&[path], None),
            Err(ScanwerkError::ImportFailed { .. })
        ));
    }

    #[test]
    fn encrypted_pdf_without_password_is_password_error() {
        // Forge an /Encrypt entry in the trailer — enough to trip the
        // password gate without building real encryption structures.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        let mut doc = Document::load_mem(&two_page_pdf()).unwrap();
        doc.trailer.set("Encrypt", lopdf::Object::Null);
        doc.save(&path).unwrap();

        match load_imports(&[path.clone()], None) {
            Err(ScanwerkError::ImportPassword { path: p }) => assert_eq!(p, path),
            other => panic!("expected ImportPassword, got {other:?}"),
        }
    }
}
