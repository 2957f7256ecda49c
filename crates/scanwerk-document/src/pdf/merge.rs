// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page-graph surgery using `lopdf` — splitting a document into
// standalone single-page documents and merging page documents back into one
// output with /Info metadata.

use chrono::Local;
use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::{debug, warn};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::options::PdfMetadata;

/// Split `doc` into one standalone single-page PDF per page, in page order.
pub fn split_into_pages(doc: &Document) -> Result<Vec<Vec<u8>>> {
    let pages = doc.get_pages();
    let mut parts = Vec::with_capacity(pages.len());

    // lopdf keys pages by 1-indexed page number in a BTreeMap, so iteration
    // order is page order.
    for (&page_number, &page_id) in &pages {
        let (mut single, pages_id) = empty_document();
        append_page(doc, &mut single, pages_id, page_id)?;

        let mut bytes = Vec::new();
        single.save_to(&mut bytes).map_err(|err| {
            ScanwerkError::Assembly(format!("failed to serialise page {page_number}: {err}"))
        })?;
        parts.push(bytes);
    }

    debug!(pages = parts.len(), "document split into single pages");
    Ok(parts)
}

/// Merge single-page (or multi-page) PDF byte blobs into one document, in
/// order, and stamp the /Info dictionary from `metadata`.
pub fn merge_pages<'a>(
    parts: impl IntoIterator<Item = &'a [u8]>,
    metadata: &PdfMetadata,
) -> Result<Vec<u8>> {
    let (mut merged, pages_id) = empty_document();

    for (index, part) in parts.into_iter().enumerate() {
        let source = Document::load_mem(part).map_err(|err| {
            ScanwerkError::Assembly(format!("failed to load page document #{}: {err}", index + 1))
        })?;
        for (_, &page_id) in &source.get_pages() {
            append_page(&source, &mut merged, pages_id, page_id)?;
        }
    }

    write_info(&mut merged, metadata);

    let mut bytes = Vec::new();
    merged
        .save_to(&mut bytes)
        .map_err(|err| ScanwerkError::Assembly(format!("failed to serialise output: {err}")))?;

    debug!(bytes = bytes.len(), "merge complete");
    Ok(bytes)
}

/// A fresh document with a well-formed Catalog → Pages skeleton.
fn empty_document() -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Object::Array(Vec::new()),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    (doc, pages_id)
}

fn write_info(doc: &mut Document, metadata: &PdfMetadata) {
    let mut info = lopdf::Dictionary::new();
    if let Some(title) = &metadata.title {
        info.set("Title", Object::string_literal(title.clone()));
    }
    if let Some(author) = &metadata.author {
        info.set("Author", Object::string_literal(author.clone()));
    }
    if let Some(subject) = &metadata.subject {
        info.set("Subject", Object::string_literal(subject.clone()));
    }
    if let Some(keywords) = &metadata.keywords {
        info.set("Keywords", Object::string_literal(keywords.clone()));
    }
    info.set("Producer", Object::string_literal("Scanwerk"));
    info.set(
        "CreationDate",
        Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
    );
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));
}

/// Clone one page object (and the resources it transitively references) from
/// `source` into `target`, appending it to the target's page tree.
fn append_page(
    source: &Document,
    target: &mut Document,
    target_pages_id: ObjectId,
    page_id: ObjectId,
) -> Result<()> {
    let page_object = source.get_object(page_id).map_err(|err| {
        ScanwerkError::Assembly(format!("cannot read page object {page_id:?}: {err}"))
    })?;

    let cloned_object = deep_clone_object(source, target, page_object)?;
    let cloned_id = target.add_object(cloned_object);

    // Hook the new page into /Kids and bump /Count.
    if let Ok(Object::Dictionary(pages_dict)) = target.get_object_mut(target_pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(cloned_id));
        }
        if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
            *count += 1;
        }
    }

    // Point the cloned page's /Parent at the target's page tree node.
    if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(target_pages_id));
    }

    Ok(())
}

/// Deep-clone a single lopdf Object, recursively resolving references.
/// /Parent is deliberately skipped to avoid circular cloning — the caller
/// patches it afterwards.
fn deep_clone_object(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let cloned = deep_clone_object(source, target, referenced)?;
                let new_id = target.add_object(cloned);
                Ok(Object::Reference(new_id))
            }
            Err(err) => {
                warn!(?ref_id, %err, "cannot resolve reference, using Null");
                Ok(Object::Null)
            }
        },
        Object::Stream(stream) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Stream(lopdf::Stream::new(
                new_dict,
                stream.content.clone(),
            )))
        }
        // Boolean, Integer, Real, String, Name, Null are trivially cloneable.
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::writer::ScanPageWriter;

    fn raster_page() -> Vec<u8> {
        let buffer = image::GrayImage::from_pixel(16, 16, image::Luma([200u8]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(buffer)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        ScanPageWriter::default()
            .page_from_image(&bytes, None)
            .unwrap()
    }

    #[test]
    fn merge_then_split_round_trips_page_count() {
        let pages = vec![raster_page(), raster_page(), raster_page()];
        let merged = merge_pages(
            pages.iter().map(|p| p.as_slice()),
            &PdfMetadata::default(),
        )
        .unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        let parts = split_into_pages(&doc).unwrap();
        assert_eq!(parts.len(), 3);
        for part in parts {
            let single = Document::load_mem(&part).unwrap();
            assert_eq!(single.get_pages().len(), 1);
        }
    }

    #[test]
    fn metadata_lands_in_info_dictionary() {
        let metadata = PdfMetadata {
            title: Some("Quarterly receipts".into()),
            author: Some("Back office".into()),
            subject: None,
            keywords: Some("receipts, 2026".into()),
        };
        let page = raster_page();
        let merged = merge_pages([page.as_slice()], &metadata).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        let info_ref = doc.trailer.get(b"Info").unwrap();
        let info_id = match info_ref {
            Object::Reference(id) => *id,
            other => panic!("Info should be a reference, got {other:?}"),
        };
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        let string_of = |key: &[u8]| match info.get(key).unwrap() {
            Object::String(bytes, _) => bytes.clone(),
            other => panic!("{} should be a string, got {other:?}", String::from_utf8_lossy(key)),
        };
        assert_eq!(string_of(b"Title"), b"Quarterly receipts");
        assert_eq!(string_of(b"Producer"), b"Scanwerk");
        assert!(info.get(b"Subject").is_err());
    }

    #[test]
    fn merge_of_nothing_yields_empty_document() {
        let merged = merge_pages(std::iter::empty(), &PdfMetadata::default()).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }
}
