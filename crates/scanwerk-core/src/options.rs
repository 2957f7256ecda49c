// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The options model for one automation run — an immutable snapshot of
// everything the pipeline needs, validated before any device access.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ScanwerkError};

/// Page-reordering transform applied to scanned pages before assembly.
///
/// A single enum rather than five independent flags: two transforms being
/// selected at once is unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderingMode {
    #[default]
    None,
    Interleave,
    AltInterleave,
    Deinterleave,
    AltDeinterleave,
    Reverse,
}

/// PDF /Info metadata fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

impl PdfMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }
}

/// Where the encryption configuration comes from, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EncryptionChoice {
    #[default]
    None,
    /// Read an encrypt-config JSON file at this path.
    File(PathBuf),
    /// Use the encryption configured in the GUI settings, if any.
    Saved,
}

/// OCR directives. `disable` always wins; a language implies enablement.
#[derive(Debug, Clone, Default)]
pub struct OcrOptions {
    pub enable: bool,
    pub disable: bool,
    pub language: Option<String>,
}

impl OcrOptions {
    /// The language OCR should run with, or `None` when OCR is off.
    pub fn resolved_language(&self) -> Option<&str> {
        if self.disable {
            return None;
        }
        if self.language.is_some() {
            return self.language.as_deref();
        }
        if self.enable { Some("eng") } else { None }
    }
}

/// Email delivery settings. Only constructible with an attachment filename,
/// so recipient/subject/body fields cannot exist without an email target.
#[derive(Debug, Clone)]
pub struct EmailOptions {
    /// Name the attachment carries in the message. The extension determines
    /// the output type when no separate output path is given.
    pub filename: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Send without prompting the user for changes.
    pub auto_send: bool,
    /// Additionally skip the login prompt; fails if authentication would be
    /// required interactively.
    pub silent_send: bool,
}

impl EmailOptions {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: None,
            body: None,
            auto_send: false,
            silent_send: false,
        }
    }
}

/// Immutable configuration snapshot for one invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Output path template; may contain `$(YYYY)`-style placeholders.
    pub output: Option<String>,
    /// Use the auto-save settings from the selected profile.
    pub auto_save: bool,
    /// Profile name; the most-recently-used profile is selected when unset.
    pub profile: Option<String>,
    /// Files to import, prepended to the output in this order.
    pub imports: Vec<PathBuf>,
    pub import_password: Option<String>,
    pub verbose: bool,
    /// Number of scans to perform. Must be at least 1.
    pub scans: u32,
    /// Delay between consecutive scans (not before the first or after the last).
    pub delay: Duration,
    pub force_overwrite: bool,
    pub wait_for_enter: bool,
    pub ordering: OrderingMode,
    pub pdf_metadata: PdfMetadata,
    pub use_saved_metadata: bool,
    pub encryption: EncryptionChoice,
    pub ocr: OcrOptions,
    pub email: Option<EmailOptions>,
    /// Quality of saved JPEG files (0-100).
    pub jpeg_quality: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            output: None,
            auto_save: false,
            profile: None,
            imports: Vec::new(),
            import_password: None,
            verbose: false,
            scans: 1,
            delay: Duration::ZERO,
            force_overwrite: false,
            wait_for_enter: false,
            ordering: OrderingMode::None,
            pdf_metadata: PdfMetadata::default(),
            use_saved_metadata: false,
            encryption: EncryptionChoice::None,
            ocr: OcrOptions::default(),
            email: None,
            jpeg_quality: 75,
        }
    }
}

impl ScanOptions {
    /// Check the cross-field invariants. Runs before any device access; a
    /// contradictory configuration is always fatal and never retried.
    pub fn validate(&self) -> Result<()> {
        if self.scans < 1 {
            return Err(ScanwerkError::Configuration(
                "the number of scans must be at least 1".into(),
            ));
        }
        if self.jpeg_quality > 100 {
            return Err(ScanwerkError::Configuration(format!(
                "jpeg quality must be between 0 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if let Some(email) = &self.email {
            if email.silent_send && !email.auto_send {
                return Err(ScanwerkError::Configuration(
                    "--silent-send requires --auto-send".into(),
                ));
            }
            if email.filename.trim().is_empty() {
                return Err(ScanwerkError::Configuration(
                    "the email attachment filename must not be empty".into(),
                ));
            }
        }
        if self.output.is_none() && !self.auto_save && self.email.is_none() {
            return Err(ScanwerkError::Configuration(
                "nothing to do: pass --output, --autosave, or --email".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_output() -> ScanOptions {
        ScanOptions {
            output: Some("out.pdf".into()),
            ..Default::default()
        }
    }

    #[test]
    fn default_options_have_no_target() {
        assert!(ScanOptions::default().validate().is_err());
    }

    #[test]
    fn zero_scans_rejected() {
        let opts = ScanOptions {
            scans: 0,
            ..with_output()
        };
        assert!(matches!(
            opts.validate(),
            Err(ScanwerkError::Configuration(_))
        ));
    }

    #[test]
    fn silent_send_requires_auto_send() {
        let mut email = EmailOptions::new("scan.pdf");
        email.silent_send = true;
        let opts = ScanOptions {
            email: Some(email),
            ..with_output()
        };
        assert!(matches!(
            opts.validate(),
            Err(ScanwerkError::Configuration(_))
        ));
    }

    #[test]
    fn silent_send_with_auto_send_accepted() {
        let mut email = EmailOptions::new("scan.pdf");
        email.auto_send = true;
        email.silent_send = true;
        let opts = ScanOptions {
            email: Some(email),
            ..with_output()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn disable_ocr_wins_over_enable() {
        let ocr = OcrOptions {
            enable: true,
            disable: true,
            language: Some("fra".into()),
        };
        assert_eq!(ocr.resolved_language(), None);
    }

    #[test]
    fn ocr_language_implies_enable() {
        let ocr = OcrOptions {
            language: Some("deu".into()),
            ..Default::default()
        };
        assert_eq!(ocr.resolved_language(), Some("deu"));
    }

    #[test]
    fn ocr_enable_defaults_to_english() {
        let ocr = OcrOptions {
            enable: true,
            ..Default::default()
        };
        assert_eq!(ocr.resolved_language(), Some("eng"));
    }

    #[test]
    fn jpeg_quality_bounds() {
        let opts = ScanOptions {
            jpeg_quality: 101,
            ..with_output()
        };
        assert!(opts.validate().is_err());
    }
}
