// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk automation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Unique identifier for one automation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One encoded image produced by a scan driver.
///
/// Drivers hand back whatever the device produced (PNG, JPEG, TIFF frame);
/// the bytes are decoded lazily, only when a stage actually needs pixels.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Where a page came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Acquired from the scan device. Both indices are 1-based: `acquisition`
    /// counts the driver invocations within the run, `position` counts pages
    /// within that acquisition in encounter order.
    Scanned { acquisition: u32, position: u32 },
    /// Decoded from an externally supplied file.
    Imported { path: PathBuf },
}

/// The payload of a page.
///
/// Scanned pages and image imports carry encoded raster bytes; PDF imports
/// carry a standalone single-page PDF so assembly can pass them through
/// without re-rendering.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Encoded raster image bytes (PNG/JPEG/TIFF).
    Raster(Vec<u8>),
    /// A complete single-page PDF document.
    Pdf(Vec<u8>),
}

/// One page of the document under assembly. Each page owns its data — no two
/// pages in a sequence share an underlying buffer.
#[derive(Debug, Clone)]
pub struct Page {
    pub content: PageContent,
    pub source: PageSource,
}

impl Page {
    pub fn scanned(bytes: Vec<u8>, acquisition: u32, position: u32) -> Self {
        Self {
            content: PageContent::Raster(bytes),
            source: PageSource::Scanned {
                acquisition,
                position,
            },
        }
    }

    pub fn imported_raster(bytes: Vec<u8>, path: PathBuf) -> Self {
        Self {
            content: PageContent::Raster(bytes),
            source: PageSource::Imported { path },
        }
    }

    pub fn imported_pdf(bytes: Vec<u8>, path: PathBuf) -> Self {
        Self {
            content: PageContent::Pdf(bytes),
            source: PageSource::Imported { path },
        }
    }

    /// Whether this page was acquired from the device (as opposed to imported).
    pub fn is_scanned(&self) -> bool {
        matches!(self.source, PageSource::Scanned { .. })
    }
}

/// An ordered sequence of pages, unique to one run.
///
/// Created empty by the run controller, appended to during acquisition,
/// reordered by the sequencer, prefixed by the import merger, then consumed
/// read-only by assembly.
#[derive(Debug, Default)]
pub struct PageSequence {
    pages: Vec<Page>,
}

impl PageSequence {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    /// Consume the sequence, yielding the owned pages.
    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    /// Prepend `front` as a contiguous block ahead of the existing pages.
    pub fn prepend(&mut self, front: Vec<Page>) {
        let mut combined = front;
        combined.append(&mut self.pages);
        self.pages = combined;
    }

    /// Replace the page order with the result of `transform`.
    pub fn reorder(&mut self, transform: impl FnOnce(Vec<Page>) -> Vec<Page>) {
        let pages = std::mem::take(&mut self.pages);
        self.pages = transform(pages);
    }
}

impl From<Vec<Page>> for PageSequence {
    fn from(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl FromIterator<Page> for PageSequence {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

/// Supported output formats, selected by the resolved file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Jpeg,
    Png,
    Tiff,
}

impl OutputFormat {
    /// Infer the output format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    /// Files written, in creation order. Empty when every acquisition came
    /// back empty and there was nothing to assemble.
    pub output_paths: Vec<PathBuf>,
    pub page_count: usize,
    /// SHA-256 hex fingerprint of the first output file.
    pub document_hash: Option<String>,
    pub emailed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Cooperative cancellation flag shared between the CLI signal handler and
/// the pipeline. Cheap to clone; checked during delays and between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
