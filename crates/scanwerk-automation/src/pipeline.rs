// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The scan orchestration pipeline.
//
// One run flows linearly: validate options → preflight imports → drive the
// acquisitions → reorder scanned pages → prepend imports → resolve the
// output path → assemble → encrypt → write → email. Every stage depends
// only on the previous stage's output. Fail-fast throughout: no partial
// document is ever written, and saving and emailing are independent commit
// points — a delivery failure never deletes the saved file.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::{info, instrument, warn};

use scanwerk_core::error::{Result, RunError, ScanwerkError};
use scanwerk_core::options::{EncryptionChoice, ScanOptions};
use scanwerk_core::settings::{EncryptConfig, SavedSettings, ScanProfile};
use scanwerk_core::types::{CancelToken, OutputFormat, PageSequence, RunId, RunSummary};

use scanwerk_document::assemble::{AssemblyRequest, OutputFile, assemble};
use scanwerk_document::import::load_imports;
use scanwerk_scan::controller::RunController;
use scanwerk_scan::driver::DriverFactory;
use scanwerk_scan::sequence;
use scanwerk_security::encrypt::DocumentEncryptor;
use scanwerk_security::integrity::hash_bytes;

use crate::mail::{EmailMessage, EmailTransport, SmtpMailer, StdinPrompt, UserPrompt};
use crate::placeholders;

/// Orchestrates one automated scanning run.
///
/// The saved settings are read-only context; the driver factory, email
/// transport, and prompts are injectable seams so the pipeline runs under
/// test without hardware, SMTP, or a TTY.
pub struct ScanPipeline {
    options: ScanOptions,
    settings: SavedSettings,
    factory: DriverFactory,
    transport: Option<Box<dyn EmailTransport + Send + Sync>>,
    prompt: Arc<dyn UserPrompt + Send + Sync>,
    cancel: CancelToken,
}

impl ScanPipeline {
    pub fn new(options: ScanOptions, settings: SavedSettings) -> Self {
        Self {
            options,
            settings,
            factory: DriverFactory::with_builtin_drivers(),
            transport: None,
            prompt: Arc::new(StdinPrompt),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_driver_factory(mut self, factory: DriverFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_transport(
        mut self,
        transport: Box<dyn EmailTransport + Send + Sync>,
    ) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn UserPrompt + Send + Sync>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the run.
    #[instrument(skip_all, fields(scans = self.options.scans))]
    pub fn run(&mut self) -> std::result::Result<RunSummary, RunError> {
        let run_id = RunId::new();
        info!(%run_id, "run starting");

        self.options.validate()?;
        let profile = self.resolve_profile()?.clone();

        // Imports are validated and loaded before the device is touched, so
        // a bad path aborts while the scanner is still idle.
        let imports = load_imports(&self.options.imports, self.options.import_password.as_deref())?;
        let mut pages_completed = imports.len();

        let mut sequence =
            self.acquire_pages(&profile, &mut pages_completed)?;

        sequence.reorder(|pages| sequence::apply(self.options.ordering, pages));
        sequence.prepend(imports);

        if sequence.is_empty() {
            warn!("nothing scanned and nothing imported; no output written");
            return Ok(RunSummary {
                run_id,
                output_paths: Vec::new(),
                page_count: 0,
                document_hash: None,
                emailed: false,
                completed_at: chrono::Utc::now(),
            });
        }

        let fail = |err: ScanwerkError| RunError::new(pages_completed, err);

        // Hold the temp dir guard for email-only runs until delivery is done.
        let (template, _temp_dir) = self.output_template(&profile).map_err(fail)?;
        let resolved = placeholders::resolve(&template, Local::now()).map_err(fail)?;

        let format = resolved
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .ok_or_else(|| {
                fail(ScanwerkError::Configuration(format!(
                    "unsupported output extension on {}",
                    resolved.display()
                )))
            })?;

        let encryption = self.resolve_encryption(format).map_err(fail)?;
        let metadata = if self.options.use_saved_metadata {
            self.settings.pdf_metadata.clone().unwrap_or_default()
        } else {
            self.options.pdf_metadata.clone()
        };

        self.check_overwrite(&resolved).map_err(fail)?;

        let request = AssemblyRequest {
            pages: &sequence,
            format,
            metadata: &metadata,
            ocr_language: self.options.ocr.resolved_language(),
            jpeg_quality: self.options.jpeg_quality,
            output_path: &resolved,
        };
        let files = assemble(&request).map_err(fail)?;

        let (output_paths, document_hash) =
            self.write_outputs(files, encryption.as_ref()).map_err(fail)?;

        let emailed = self
            .deliver_email(&output_paths)
            .map_err(|err| RunError::new(pages_completed, err))?;

        info!(
            %run_id,
            pages = sequence.len(),
            outputs = output_paths.len(),
            emailed,
            "run complete"
        );

        Ok(RunSummary {
            run_id,
            output_paths,
            page_count: sequence.len(),
            document_hash,
            emailed,
            completed_at: chrono::Utc::now(),
        })
    }

    // -- Stages ----------------------------------------------------------------

    fn resolve_profile(&self) -> Result<&ScanProfile> {
        match &self.options.profile {
            Some(name) => self.settings.find_profile(name).ok_or_else(|| {
                ScanwerkError::Configuration(format!("no scan profile named '{name}'"))
            }),
            None => self.settings.default_profile().ok_or_else(|| {
                ScanwerkError::Configuration("no scan profiles are configured".into())
            }),
        }
    }

    fn acquire_pages(
        &mut self,
        profile: &ScanProfile,
        pages_completed: &mut usize,
    ) -> std::result::Result<PageSequence, RunError> {
        let mut driver = self
            .factory
            .create(profile)
            .map_err(|err| RunError::new(*pages_completed, err))?;

        let mut controller = RunController::new(
            driver.as_mut(),
            profile,
            self.options.scans,
            self.options.delay,
            self.cancel.clone(),
        );
        let result = controller.run();
        let collected = controller.pages_collected();

        match result {
            Ok(sequence) => {
                *pages_completed += sequence.len();
                Ok(sequence)
            }
            Err(err) => Err(RunError::new(*pages_completed + collected, err)),
        }
    }

    /// The output template for this run, plus a temp-dir guard when the run
    /// is email-only and assembles into a temporary location.
    fn output_template(
        &self,
        profile: &ScanProfile,
    ) -> Result<(String, Option<tempfile::TempDir>)> {
        if let Some(output) = &self.options.output {
            return Ok((output.clone(), None));
        }
        if self.options.auto_save {
            let auto_save = profile.auto_save.as_ref().ok_or_else(|| {
                ScanwerkError::Configuration(format!(
                    "profile '{}' has no auto-save settings",
                    profile.display_name
                ))
            })?;
            return Ok((auto_save.path_template.clone(), None));
        }
        // validate() guarantees email is set when we get here.
        let email = self.options.email.as_ref().ok_or_else(|| {
            ScanwerkError::Configuration("no output target configured".into())
        })?;
        let dir = tempfile::tempdir()?;
        let template = dir.path().join(&email.filename).display().to_string();
        Ok((template, Some(dir)))
    }

    fn resolve_encryption(&self, format: OutputFormat) -> Result<Option<EncryptConfig>> {
        let config = match &self.options.encryption {
            EncryptionChoice::None => None,
            EncryptionChoice::File(path) => Some(EncryptConfig::load(path)?),
            EncryptionChoice::Saved => Some(self.settings.encrypt_config.clone().ok_or_else(
                || {
                    ScanwerkError::Configuration(
                        "no saved encryption config; set one up in the GUI first".into(),
                    )
                },
            )?),
        };
        if config.is_some() && format.is_image() {
            return Err(ScanwerkError::Configuration(
                "encryption requires PDF output".into(),
            ));
        }
        Ok(config)
    }

    fn check_overwrite(&self, path: &std::path::Path) -> Result<()> {
        if !self.options.force_overwrite && path.exists() {
            return Err(ScanwerkError::OutputExists {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn write_outputs(
        &self,
        files: Vec<OutputFile>,
        encryption: Option<&EncryptConfig>,
    ) -> Result<(Vec<PathBuf>, Option<String>)> {
        let mut paths = Vec::with_capacity(files.len());
        let mut first_hash = None;

        for file in files {
            self.check_overwrite(&file.path)?;

            let bytes = match encryption {
                Some(config) => DocumentEncryptor::new(config).encrypt(&file.bytes)?,
                None => file.bytes,
            };

            if let Some(parent) = file.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&file.path, &bytes)?;
            info!(path = %file.path.display(), bytes = bytes.len(), "output written");

            if first_hash.is_none() {
                first_hash = Some(hash_bytes(&bytes));
            }
            paths.push(file.path);
        }

        Ok((paths, first_hash))
    }

    fn deliver_email(&self, output_paths: &[PathBuf]) -> Result<bool> {
        let Some(email) = &self.options.email else {
            return Ok(false);
        };
        let attachment_path = output_paths
            .first()
            .ok_or_else(|| ScanwerkError::EmailTransport("no output file to attach".into()))?;

        let message = EmailMessage {
            to: email.to.clone(),
            cc: email.cc.clone(),
            bcc: email.bcc.clone(),
            subject: email.subject.clone().unwrap_or_default(),
            body: email.body.clone().unwrap_or_default(),
            attachment_path: attachment_path.clone(),
            attachment_name: email.filename.clone(),
        };

        if !email.auto_send && !self.prompt.confirm_send(&message)? {
            info!("email skipped at the confirmation prompt");
            return Ok(false);
        }

        match &self.transport {
            Some(transport) => transport.send(&message, email.silent_send)?,
            None => {
                let smtp = self.settings.smtp.clone().ok_or_else(|| {
                    ScanwerkError::Configuration(
                        "no SMTP account configured in the saved settings".into(),
                    )
                })?;
                SmtpMailer::new(smtp, self.prompt.clone()).send(&message, email.silent_send)?;
            }
        }
        Ok(true)
    }
}
