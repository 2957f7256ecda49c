// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-scan — Device acquisition for the Scanwerk automation engine.
//
// Provides the scan-driver abstraction (trait, registry factory, built-in
// stub and hot-folder drivers), the run controller that sequences repeated
// acquisitions, per-profile page enhancement, and the page-ordering
// transforms.

pub mod controller;
pub mod driver;
pub mod enhance;
pub mod sequence;

pub use controller::RunController;
pub use driver::{DriverFactory, PageStream, ScanDriver};
