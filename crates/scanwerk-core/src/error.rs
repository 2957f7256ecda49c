// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // -- Device errors --
    #[error("unknown scan driver: {0}")]
    UnknownDriver(String),

    #[error("acquisition {acquisition} failed: {detail}")]
    AcquisitionFailed { acquisition: u32, detail: String },

    // -- Import errors --
    #[error("import failed for {path}: {detail}")]
    ImportFailed { path: PathBuf, detail: String },

    #[error("import password missing or incorrect for {path}")]
    ImportPassword { path: PathBuf },

    // -- Output errors --
    #[error("output file already exists: {path} (pass --force to overwrite)")]
    OutputExists { path: PathBuf },

    #[error("document assembly failed: {0}")]
    Assembly(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Security errors --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Email errors --
    #[error("email requires authentication but silent send was requested")]
    EmailAuthRequired,

    #[error("email delivery failed: {0}")]
    EmailTransport(String),

    // -- Run control --
    #[error("run cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;

/// A failed run, annotated with how many pages had been collected before the
/// failure. Nothing is written to disk when a run fails, but the count is
/// useful for operators diagnosing unattended batches from logs alone.
#[derive(Debug, Error)]
#[error("run failed after {pages_completed} page(s): {source}")]
pub struct RunError {
    /// Pages materialised (scanned or imported) before the failure.
    pub pages_completed: usize,
    #[source]
    pub source: ScanwerkError,
}

impl RunError {
    pub fn new(pages_completed: usize, source: ScanwerkError) -> Self {
        Self {
            pages_completed,
            source,
        }
    }
}

impl From<ScanwerkError> for RunError {
    fn from(source: ScanwerkError) -> Self {
        Self {
            pages_completed: 0,
            source,
        }
    }
}
