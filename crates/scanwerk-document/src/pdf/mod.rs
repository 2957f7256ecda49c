// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF plumbing — rendering raster pages to single-page documents and
// merging page documents into the final output.

pub mod merge;
pub mod writer;

pub use merge::{merge_pages, split_into_pages};
pub use writer::ScanPageWriter;
