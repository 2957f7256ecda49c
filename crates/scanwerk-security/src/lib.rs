// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-security — Output encryption and integrity fingerprinting.

pub mod encrypt;
pub mod integrity;

pub use encrypt::DocumentEncryptor;
