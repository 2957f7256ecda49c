// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Core types and error definitions shared across all crates.

pub mod error;
pub mod options;
pub mod settings;
pub mod types;

pub use error::{RunError, ScanwerkError};
pub use options::ScanOptions;
pub use settings::SavedSettings;
pub use types::*;
