// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-automation — The unattended scan orchestration pipeline.
//
// Ties the stages together: option validation, import preflight, repeated
// acquisitions, page sequencing, output-path resolution, assembly,
// encryption, save, and email delivery.

pub mod mail;
pub mod pipeline;
pub mod placeholders;

pub use mail::{EmailMessage, EmailTransport, SmtpMailer, UserPrompt};
pub use pipeline::ScanPipeline;
