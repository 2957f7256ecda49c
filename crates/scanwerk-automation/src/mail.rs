// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Email delivery — the transport seam the pipeline dispatches through, the
// prompt seam for the confirmation and login steps, and the built-in SMTP
// transport backed by `lettre`.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::settings::SmtpConfig;

/// One outgoing message with the assembled document attached.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    /// The saved output file on disk.
    pub attachment_path: PathBuf,
    /// The name the attachment carries in the message.
    pub attachment_name: String,
}

/// Sends one message with an attachment. `silent` means no interactive
/// authentication may happen — the transport must fail with
/// `EmailAuthRequired` instead of prompting.
pub trait EmailTransport {
    fn send(&self, message: &EmailMessage, silent: bool) -> Result<()>;
}

/// The two interactive moments of a delivery: confirming the send (skipped
/// by `--auto-send`) and supplying login credentials (skipped by
/// `--silent-send`). Behind a trait so the pipeline tests need no TTY.
pub trait UserPrompt {
    /// Returns whether the user approved sending `message`.
    fn confirm_send(&self, message: &EmailMessage) -> Result<bool>;

    /// Ask for SMTP credentials for `host`. Returns (username, password).
    fn request_credentials(&self, host: &str) -> Result<(String, String)>;
}

/// Terminal prompt reading answers from stdin.
pub struct StdinPrompt;

impl UserPrompt for StdinPrompt {
    fn confirm_send(&self, message: &EmailMessage) -> Result<bool> {
        print!(
            "Send {} to {}? [y/N] ",
            message.attachment_name,
            message.to.join(", ")
        );
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    fn request_credentials(&self, host: &str) -> Result<(String, String)> {
        print!("Username for {host}: ");
        std::io::stdout().flush()?;
        let mut username = String::new();
        std::io::stdin().read_line(&mut username)?;

        print!("Password: ");
        std::io::stdout().flush()?;
        let mut password = String::new();
        std::io::stdin().read_line(&mut password)?;

        Ok((username.trim().to_string(), password.trim().to_string()))
    }
}

/// SMTP delivery via `lettre`, configured from the saved SMTP account.
pub struct SmtpMailer {
    config: SmtpConfig,
    prompt: Arc<dyn UserPrompt + Send + Sync>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig, prompt: Arc<dyn UserPrompt + Send + Sync>) -> Self {
        Self { config, prompt }
    }

    /// Stored credentials, or a login prompt — unless `silent`, in which
    /// case missing credentials are a hard failure.
    fn resolve_credentials(&self, silent: bool) -> Result<(String, String)> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => Ok((user.clone(), pass.clone())),
            _ if silent => Err(ScanwerkError::EmailAuthRequired),
            _ => self.prompt.request_credentials(&self.config.host),
        }
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message> {
        if message.to.is_empty() {
            return Err(ScanwerkError::Configuration(
                "email requires at least one --to recipient".into(),
            ));
        }

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.from)?)
            .subject(message.subject.clone());
        for to in &message.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &message.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }
        for bcc in &message.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }

        let attachment_bytes = std::fs::read(&message.attachment_path)?;
        let content_type = ContentType::parse(content_type_for(&message.attachment_name))
            .map_err(|err| ScanwerkError::EmailTransport(err.to_string()))?;

        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(message.body.clone()))
                    .singlepart(
                        Attachment::new(message.attachment_name.clone())
                            .body(attachment_bytes, content_type),
                    ),
            )
            .map_err(|err| ScanwerkError::EmailTransport(err.to_string()))
    }
}

impl EmailTransport for SmtpMailer {
    #[instrument(skip_all, fields(host = %self.config.host, silent))]
    fn send(&self, message: &EmailMessage, silent: bool) -> Result<()> {
        let (username, password) = self.resolve_credentials(silent)?;
        let email = self.build_message(message)?;

        let mailer = SmtpTransport::starttls_relay(&self.config.host)
            .map_err(|err| ScanwerkError::EmailTransport(err.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(username, password))
            .build();

        mailer
            .send(&email)
            .map_err(|err| ScanwerkError::EmailTransport(err.to_string()))?;

        info!(
            to = message.to.len(),
            attachment = %message.attachment_name,
            "email delivered"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.parse().map_err(|_| {
        ScanwerkError::Configuration(format!("invalid email address: {address}"))
    })
}

/// MIME type for the attachment, from its filename extension.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A prompt that must never be reached.
    struct NoPrompt;

    impl UserPrompt for NoPrompt {
        fn confirm_send(&self, _message: &EmailMessage) -> Result<bool> {
            panic!("confirm_send must not be called");
        }

        fn request_credentials(&self, _host: &str) -> Result<(String, String)> {
            panic!("request_credentials must not be called in silent mode");
        }
    }

    fn config(username: Option<&str>, password: Option<&str>) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.org".into(),
            port: 587,
            username: username.map(String::from),
            password: password.map(String::from),
            from: "Scanwerk <scans@example.org>".into(),
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: vec!["archive@example.org".into()],
            cc: vec![],
            bcc: vec![],
            subject: "Scanned receipts".into(),
            body: "Attached.".into(),
            attachment_path: PathBuf::from("/tmp/out.pdf"),
            attachment_name: "out.pdf".into(),
        }
    }

    #[test]
    fn silent_send_without_credentials_fails_with_auth_required() {
        let mailer = SmtpMailer::new(config(None, None), Arc::new(NoPrompt));
        match mailer.resolve_credentials(true) {
            Err(ScanwerkError::EmailAuthRequired) => {}
            other => panic!("expected EmailAuthRequired, got {other:?}"),
        }
    }

    #[test]
    fn stored_credentials_are_used_without_prompting() {
        let mailer = SmtpMailer::new(config(Some("scans"), Some("hunter2")), Arc::new(NoPrompt));
        let (user, pass) = mailer.resolve_credentials(true).unwrap();
        assert_eq!(user, "scans");
        assert_eq!(pass, "hunter2");
    }

    #[test]
    fn message_without_recipients_is_rejected() {
        let mailer = SmtpMailer::new(config(Some("u"), Some("p")), Arc::new(NoPrompt));
        let mut msg = message();
        msg.to.clear();
        assert!(matches!(
            mailer.build_message(&msg),
            Err(ScanwerkError::Configuration(_))
        ));
    }

    #[test]
    fn bad_recipient_address_is_a_configuration_error() {
        let mailer = SmtpMailer::new(config(Some("u"), Some("p")), Arc::new(NoPrompt));
        let mut msg = message();
        msg.to = vec!["not an address".into()];
        assert!(matches!(
            mailer.build_message(&msg),
            Err(ScanwerkError::Configuration(_))
        ));
    }

    #[test]
    fn attachment_content_type_follows_extension() {
        assert_eq!(content_type_for("scan.pdf"), "application/pdf");
        assert_eq!(content_type_for("scan.JPG"), "image/jpeg");
        assert_eq!(content_type_for("scan.bin"), "application/octet-stream");
    }
}
