// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The command-line surface, mapped onto a validated `ScanOptions`.
//
// Ordering flags live in one clap group so two of them cannot be passed
// together; email flags require the email target via clap `requires`, and
// the cross-field invariants are re-checked by `ScanOptions::validate`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::options::{
    EmailOptions, EncryptionChoice, OcrOptions, OrderingMode, PdfMetadata, ScanOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "scanwerk",
    version,
    about = "Unattended document scanning: acquire, reorder, assemble, deliver"
)]
pub struct Cli {
    /// The name and path of the file to save. The extension determines the
    /// output type (.pdf, .jpg, .png, .tif). Placeholders: $(YYYY)-$(MM)-$(DD)
    /// for the date, $(hh)_$(mm)_$(ss) for the time, $(nnnn) for an
    /// auto-incrementing number.
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Use the auto-save settings from the selected profile.
    #[arg(short = 'a', long)]
    pub autosave: bool,

    /// The name of the profile to use for scanning. Defaults to the
    /// most-recently-used profile.
    #[arg(short = 'p', long)]
    pub profile: Option<String>,

    /// One or more PDF/image files to import, prepended to the output in the
    /// order they are specified. Separate multiple files with ";".
    #[arg(short = 'i', long, value_delimiter = ';', value_name = "FILES")]
    pub import: Vec<PathBuf>,

    /// The password for importing encrypted PDF files.
    #[arg(long)]
    pub import_password: Option<String>,

    /// Display progress information. Without it a successful run prints
    /// nothing.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// The number of scans to perform.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub number: u32,

    /// The delay (in milliseconds) between each scan.
    #[arg(short = 'd', long, default_value_t = 0)]
    pub delay: u64,

    /// Overwrite existing files.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// After finishing, wait for Enter before exiting.
    #[arg(short = 'w', long)]
    pub wait: bool,

    // -- Order options --
    /// Interleave pages before saving.
    #[arg(long, group = "ordering")]
    pub interleave: bool,

    /// Alternate-interleave pages before saving.
    #[arg(long, group = "ordering")]
    pub alt_interleave: bool,

    /// Deinterleave pages before saving.
    #[arg(long, group = "ordering")]
    pub deinterleave: bool,

    /// Alternate-deinterleave pages before saving.
    #[arg(long, group = "ordering")]
    pub alt_deinterleave: bool,

    /// Reverse pages before saving.
    #[arg(long, group = "ordering")]
    pub reverse: bool,

    // -- PDF options --
    /// The title for generated PDF metadata.
    #[arg(long)]
    pub pdf_title: Option<String>,

    /// The author for generated PDF metadata.
    #[arg(long)]
    pub pdf_author: Option<String>,

    /// The subject for generated PDF metadata.
    #[arg(long)]
    pub pdf_subject: Option<String>,

    /// The keywords for generated PDF metadata.
    #[arg(long)]
    pub pdf_keywords: Option<String>,

    /// Use the metadata configured in the GUI, if any.
    #[arg(long)]
    pub use_saved_metadata: bool,

    /// A JSON file configuring encryption for the output.
    #[arg(long, value_name = "FILE", conflicts_with = "use_saved_encrypt_config")]
    pub encrypt_config: Option<PathBuf>,

    /// Use the encryption configured in the GUI, if any.
    #[arg(long)]
    pub use_saved_encrypt_config: bool,

    // -- OCR options --
    /// Enable OCR for generated PDFs.
    #[arg(long)]
    pub enable_ocr: bool,

    /// Disable OCR for generated PDFs. Overrides --enable-ocr.
    #[arg(long)]
    pub disable_ocr: bool,

    /// The three-letter code of the OCR language (e.g. 'eng', 'fra').
    /// Implies --enable-ocr.
    #[arg(long, value_name = "LANG")]
    pub ocr_lang: Option<String>,

    // -- Email options --
    /// The name of the file to attach to an email. The extension determines
    /// the output type.
    #[arg(short = 'e', long, value_name = "FILENAME")]
    pub email: Option<String>,

    /// The email message's subject. Requires -e/--email.
    #[arg(long, requires = "email")]
    pub subject: Option<String>,

    /// The email message's body text. Requires -e/--email.
    #[arg(long, requires = "email")]
    pub body: Option<String>,

    /// Comma-separated recipient addresses. Requires -e/--email.
    #[arg(long, value_delimiter = ',', requires = "email")]
    pub to: Vec<String>,

    /// Comma-separated CC addresses. Requires -e/--email.
    #[arg(long, value_delimiter = ',', requires = "email")]
    pub cc: Vec<String>,

    /// Comma-separated BCC addresses. Requires -e/--email.
    #[arg(long, value_delimiter = ',', requires = "email")]
    pub bcc: Vec<String>,

    /// Send the email immediately after the scan completes, without
    /// prompting for changes. May still prompt for login — see
    /// --silent-send. Requires -e/--email.
    #[arg(long, requires = "email")]
    pub auto_send: bool,

    /// Don't prompt for login when --auto-send is given. Fails if
    /// authentication would be required. Requires --auto-send.
    #[arg(long, requires = "auto_send")]
    pub silent_send: bool,

    // -- Image options --
    /// The quality of saved JPEG files (0-100).
    #[arg(long, default_value_t = 75)]
    pub jpeg_quality: u8,

    /// Path of the saved-settings JSON file.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// Convert the parsed flags into the validated options snapshot.
    pub fn into_options(self) -> Result<ScanOptions> {
        let ordering = match (
            self.interleave,
            self.alt_interleave,
            self.deinterleave,
            self.alt_deinterleave,
            self.reverse,
        ) {
            (true, _, _, _, _) => OrderingMode::Interleave,
            (_, true, _, _, _) => OrderingMode::AltInterleave,
            (_, _, true, _, _) => OrderingMode::Deinterleave,
            (_, _, _, true, _) => OrderingMode::AltDeinterleave,
            (_, _, _, _, true) => OrderingMode::Reverse,
            _ => OrderingMode::None,
        };

        let email = match self.email {
            Some(filename) => Some(EmailOptions {
                filename,
                to: self.to,
                cc: self.cc,
                bcc: self.bcc,
                subject: self.subject,
                body: self.body,
                auto_send: self.auto_send,
                silent_send: self.silent_send,
            }),
            None => {
                // clap's `requires` already enforces this for parsed input;
                // re-checked here for options built programmatically.
                if self.auto_send
                    || self.silent_send
                    || !self.to.is_empty()
                    || !self.cc.is_empty()
                    || !self.bcc.is_empty()
                    || self.subject.is_some()
                    || self.body.is_some()
                {
                    return Err(ScanwerkError::Configuration(
                        "email options require -e/--email".into(),
                    ));
                }
                None
            }
        };

        let encryption = if let Some(path) = self.encrypt_config {
            EncryptionChoice::File(path)
        } else if self.use_saved_encrypt_config {
            EncryptionChoice::Saved
        } else {
            EncryptionChoice::None
        };

        let options = ScanOptions {
            output: self.output,
            auto_save: self.autosave,
            profile: self.profile,
            imports: self.import,
            import_password: self.import_password,
            verbose: self.verbose,
            scans: self.number,
            delay: Duration::from_millis(self.delay),
            force_overwrite: self.force,
            wait_for_enter: self.wait,
            ordering,
            pdf_metadata: PdfMetadata {
                title: self.pdf_title,
                author: self.pdf_author,
                subject: self.pdf_subject,
                keywords: self.pdf_keywords,
            },
            use_saved_metadata: self.use_saved_metadata,
            encryption,
            ocr: OcrOptions {
                enable: self.enable_ocr,
                disable: self.disable_ocr,
                language: self.ocr_lang,
            },
            email,
            jpeg_quality: self.jpeg_quality,
        };

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("scanwerk").chain(args.iter().copied()))
    }

    #[test]
    fn two_ordering_flags_are_rejected_at_parse_time() {
        let result = parse(&["-o", "out.pdf", "--interleave", "--reverse"]);
        assert!(result.is_err());
    }

    #[test]
    fn one_ordering_flag_maps_to_the_mode() {
        let cli = parse(&["-o", "out.pdf", "--alt-deinterleave"]).unwrap();
        let options = cli.into_options().unwrap();
        assert_eq!(options.ordering, OrderingMode::AltDeinterleave);
    }

    #[test]
    fn semicolon_separated_imports_split() {
        let cli = parse(&["-o", "out.pdf", "-i", "cover.pdf;body.pdf;back.jpg"]).unwrap();
        let options = cli.into_options().unwrap();
        assert_eq!(
            options.imports,
            vec![
                PathBuf::from("cover.pdf"),
                PathBuf::from("body.pdf"),
                PathBuf::from("back.jpg"),
            ]
        );
    }

    #[test]
    fn email_flags_without_email_target_fail() {
        assert!(parse(&["-o", "out.pdf", "--auto-send"]).is_err());
        assert!(parse(&["-o", "out.pdf", "--to", "a@example.org"]).is_err());
    }

    #[test]
    fn silent_send_requires_auto_send() {
        assert!(parse(&["-o", "out.pdf", "-e", "scan.pdf", "--silent-send"]).is_err());
        let cli = parse(&[
            "-o",
            "out.pdf",
            "-e",
            "scan.pdf",
            "--auto-send",
            "--silent-send",
        ])
        .unwrap();
        let options = cli.into_options().unwrap();
        let email = options.email.unwrap();
        assert!(email.auto_send && email.silent_send);
    }

    #[test]
    fn recipient_lists_split_on_commas() {
        let cli = parse(&[
            "-o",
            "out.pdf",
            "-e",
            "scan.pdf",
            "--to",
            "a@example.org,b@example.org",
        ])
        .unwrap();
        let options = cli.into_options().unwrap();
        assert_eq!(options.email.unwrap().to.len(), 2);
    }

    #[test]
    fn defaults_match_the_documented_ones() {
        let cli = parse(&["-o", "out.pdf"]).unwrap();
        let options = cli.into_options().unwrap();
        assert_eq!(options.scans, 1);
        assert_eq!(options.delay, Duration::ZERO);
        assert_eq!(options.jpeg_quality, 75);
        assert_eq!(options.ordering, OrderingMode::None);
    }

    #[test]
    fn no_target_at_all_is_a_configuration_error() {
        let cli = parse(&["-n", "2"]).unwrap();
        assert!(matches!(
            cli.into_options(),
            Err(ScanwerkError::Configuration(_))
        ));
    }

    #[test]
    fn encrypt_config_conflicts_with_saved() {
        assert!(parse(&[
            "-o",
            "out.pdf",
            "--encrypt-config",
            "enc.json",
            "--use-saved-encrypt-config",
        ])
        .is_err());
    }
}
