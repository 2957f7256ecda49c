// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan-driver abstraction — the trait every device backend implements, a
// registry-based factory resolving driver names to constructors, and the
// built-in stub and hot-folder drivers.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::settings::ScanProfile;
use scanwerk_core::types::RawImage;

/// A lazy, finite, non-restartable sequence of pages from one acquisition.
///
/// Pages are streamed as the device produces them. Consuming the stream twice
/// for the same physical scan is undefined — callers get one pass.
pub type PageStream = Box<dyn Iterator<Item = Result<RawImage>> + Send>;

/// One scan device backend. `acquire` corresponds to a single complete
/// capture invocation, potentially yielding multiple pages (feeder scans).
pub trait ScanDriver: Send {
    /// Driver identifier, as registered with the factory.
    fn name(&self) -> &str;

    /// Begin one acquisition. Device-level failures may surface here or as
    /// `Err` items in the returned stream.
    fn acquire(&mut self) -> Result<PageStream>;
}

type DriverCtor = Box<dyn Fn(&ScanProfile) -> Result<Box<dyn ScanDriver>> + Send + Sync>;

/// Resolves a driver identifier to a concrete driver instance.
///
/// A registration map populated at startup: new driver variants register a
/// constructor under their name, and no caller needs modifying.
#[derive(Default)]
pub struct DriverFactory {
    constructors: HashMap<String, DriverCtor>,
}

impl DriverFactory {
    /// An empty factory with no drivers registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the built-in drivers (`stub`, `folder`) registered.
    pub fn with_builtin_drivers() -> Self {
        let mut factory = Self::new();
        factory.register("stub", |_profile| {
            Ok(Box::new(StubDriver::new()) as Box<dyn ScanDriver>)
        });
        factory.register("folder", |profile| {
            let dir = profile.device_id.as_deref().ok_or_else(|| {
                ScanwerkError::Configuration(
                    "the folder driver needs the profile's device id set to a directory".into(),
                )
            })?;
            Ok(Box::new(FolderDriver::new(dir)) as Box<dyn ScanDriver>)
        });
        factory
    }

    /// Register a driver constructor under `name`, replacing any previous
    /// registration.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn(&ScanProfile) -> Result<Box<dyn ScanDriver>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(ctor));
    }

    /// Create the driver named by `profile.driver_name`.
    pub fn create(&self, profile: &ScanProfile) -> Result<Box<dyn ScanDriver>> {
        let ctor = self
            .constructors
            .get(&profile.driver_name)
            .ok_or_else(|| ScanwerkError::UnknownDriver(profile.driver_name.clone()))?;
        let driver = ctor(profile)?;
        info!(driver = driver.name(), profile = %profile.display_name, "driver created");
        Ok(driver)
    }
}

// -- Stub driver --------------------------------------------------------------

/// Letter-size blank page dimensions at 100 DPI.
const STUB_PAGE_WIDTH: u32 = 850;
const STUB_PAGE_HEIGHT: u32 = 1100;

/// Produces blank white pages without touching hardware. Used for smoke
/// tests and dry runs of an automation configuration.
pub struct StubDriver {
    pages_per_scan: u32,
}

impl StubDriver {
    pub fn new() -> Self {
        Self { pages_per_scan: 1 }
    }

    /// A stub yielding `pages` blank pages per acquisition.
    pub fn with_pages(pages: u32) -> Self {
        Self {
            pages_per_scan: pages,
        }
    }

    fn blank_page() -> Result<Vec<u8>> {
        let buffer = image::GrayImage::from_pixel(STUB_PAGE_WIDTH, STUB_PAGE_HEIGHT, image::Luma([255u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| ScanwerkError::Image(format!("blank page encoding failed: {err}")))?;
        Ok(bytes)
    }
}

impl Default for StubDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanDriver for StubDriver {
    fn name(&self) -> &str {
        "stub"
    }

    fn acquire(&mut self) -> Result<PageStream> {
        let blank = Self::blank_page()?;
        debug!(pages = self.pages_per_scan, "stub acquisition");
        let stream = (0..self.pages_per_scan).map(move |_| Ok(RawImage::new(blank.clone())));
        Ok(Box::new(stream))
    }
}

// -- Hot-folder driver --------------------------------------------------------

/// File extensions the folder driver picks up.
const FOLDER_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Acquires pages from a drop directory — the pattern used by network
/// scanners that deposit files into a shared folder. Each acquisition picks
/// up files this driver instance has not consumed yet, in lexicographic
/// order, and reads them lazily as the stream is drained.
pub struct FolderDriver {
    dir: PathBuf,
    consumed: HashSet<PathBuf>,
}

impl FolderDriver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            consumed: HashSet::new(),
        }
    }

    fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || self.consumed.contains(&path) {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| FOLDER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ScanDriver for FolderDriver {
    fn name(&self) -> &str {
        "folder"
    }

    fn acquire(&mut self) -> Result<PageStream> {
        let files = self.pending_files()?;
        self.consumed.extend(files.iter().cloned());
        debug!(dir = %self.dir.display(), files = files.len(), "folder acquisition");
        let stream = files.into_iter().map(|path| {
            let bytes = std::fs::read(&path)?;
            Ok(RawImage::new(bytes))
        });
        Ok(Box::new(stream))
    }
}
