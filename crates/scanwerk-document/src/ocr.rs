// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR for scanned pages using the `ocrs` crate, a pure-Rust engine backed by
// neural network models executed via `rten`.
//
// # Feature Gate
//
// Only available when the `ocr` feature is enabled:
//
// ```toml
// scanwerk-document = { path = "crates/scanwerk-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// Two model files are required per language directory:
//
// - `text-detection.rten` — locates text regions in the page image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// The cache layout is `$XDG_CACHE_HOME/scanwerk/ocr/<lang>/`, falling back to
// the cache root itself when no language subdirectory exists. Models can be
// obtained from the ocrs-models releases or by running `ocrs-cli` once.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use scanwerk_core::error::{Result, ScanwerkError};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Root of the model cache: `$XDG_CACHE_HOME/scanwerk/ocr`, falling back to
/// `~/.cache/scanwerk/ocr`.
fn default_model_root() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache")
    } else {
        PathBuf::from("ocr-models")
    };
    base.join("scanwerk").join("ocr")
}

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl OcrConfig {
    /// Config for a language: uses the `<cache>/<lang>` subdirectory when it
    /// exists, otherwise the cache root (the stock models are multi-script).
    pub fn for_language(language: &str) -> Self {
        let root = default_model_root();
        let lang_dir = root.join(language);
        let dir = if lang_dir.is_dir() { lang_dir } else { root };
        Self::from_dir(dir)
    }

    /// Config reading both model files from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        if !self.detection_model_path.exists() {
            return Err(ScanwerkError::Ocr(format!(
                "detection model not found at {}; run `ocrs-cli` once to download models",
                self.detection_model_path.display()
            )));
        }
        if !self.recognition_model_path.exists() {
            return Err(ScanwerkError::Ocr(format!(
                "recognition model not found at {}; run `ocrs-cli` once to download models",
                self.recognition_model_path.display()
            )));
        }
        Ok(())
    }
}

/// Scanwerk OCR engine — extracts text from scanned page images.
///
/// Model loading is the expensive step; the engine is built once per run and
/// reused for every page. The `ocrs` and `rten` crates must be compiled in
/// release mode — debug builds are 10-100x slower.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("loading OCR models");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            ScanwerkError::Ocr(format!(
                "failed to load detection model from {}: {err}",
                config.detection_model_path.display()
            ))
        })?;
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                ScanwerkError::Ocr(format!(
                    "failed to load recognition model from {}: {err}",
                    config.recognition_model_path.display()
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ScanwerkError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        Ok(Self { engine })
    }

    /// Engine for the given language's model directory.
    pub fn for_language(language: &str) -> Result<Self> {
        Self::new(OcrConfig::for_language(language))
    }

    /// Extract all text from one page image, lines separated by newlines.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ScanwerkError::Ocr(format!("failed to create image source ({width}x{height}): {err}"))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| ScanwerkError::Ocr(format!("OCR preprocessing failed: {err}")))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| ScanwerkError::Ocr(format!("OCR text recognition failed: {err}")))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir_uses_well_known_filenames() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn validate_missing_models() {
        let config = OcrConfig::from_dir("/nonexistent/path/ocr-models");
        assert!(config.validate().is_err());
    }

    #[test]
    fn language_without_subdirectory_falls_back_to_root() {
        let config = OcrConfig::for_language("no-such-language");
        let path = config.detection_model_path.to_string_lossy().into_owned();
        assert!(
            !path.contains("no-such-language"),
            "missing language dirs must fall back to the cache root, got {path}"
        );
    }
}
