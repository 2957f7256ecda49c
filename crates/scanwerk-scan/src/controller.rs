// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run controller — executes N acquisitions against one driver with an
// inter-scan delay, materialising raw images into stamped pages.
//
// Fail-fast: a device failure mid-acquisition aborts the whole run, since
// an unattended run has nobody present to notice a silently short document.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::settings::ScanProfile;
use scanwerk_core::types::{CancelToken, Page, PageSequence};

use crate::driver::ScanDriver;
use crate::enhance;

/// Granularity of the blocking inter-scan wait. Cancellation is honoured at
/// this resolution.
const DELAY_SLICE: Duration = Duration::from_millis(50);

/// Drives one run's acquisitions against a single driver instance.
///
/// The device is a serially-accessed resource: acquisitions never overlap,
/// and the delay is a blocking wait on the calling thread.
pub struct RunController<'a> {
    driver: &'a mut dyn ScanDriver,
    profile: &'a ScanProfile,
    scans: u32,
    delay: Duration,
    cancel: CancelToken,
    collected: usize,
}

impl<'a> RunController<'a> {
    pub fn new(
        driver: &'a mut dyn ScanDriver,
        profile: &'a ScanProfile,
        scans: u32,
        delay: Duration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            driver,
            profile,
            scans,
            delay,
            cancel,
            collected: 0,
        }
    }

    /// Pages materialised so far — meaningful after a failed `run` for
    /// partial-progress reporting.
    pub fn pages_collected(&self) -> usize {
        self.collected
    }

    /// Perform the configured acquisitions, waiting `delay` between
    /// consecutive ones (not before the first or after the last).
    ///
    /// Returns the flat sequence in acquisition order, then position order
    /// within each acquisition. Any device failure aborts the run with
    /// `AcquisitionFailed`; cancellation aborts with `Cancelled` and the
    /// collected pages are discarded by the caller.
    #[instrument(skip_all, fields(driver = self.driver.name(), scans = self.scans))]
    pub fn run(&mut self) -> Result<PageSequence> {
        let mut sequence = PageSequence::new();

        for acquisition in 1..=self.scans {
            if acquisition > 1 {
                self.wait_between_scans()?;
            }
            self.check_cancelled()?;

            let count = self.acquire_into(&mut sequence, acquisition)?;
            if count == 0 {
                // Not necessarily an error — the feeder may simply be empty.
                warn!(acquisition, "empty scan: the device reported no pages");
            } else {
                info!(acquisition, pages = count, "acquisition complete");
            }
        }

        Ok(sequence)
    }

    fn acquire_into(&mut self, sequence: &mut PageSequence, acquisition: u32) -> Result<u32> {
        let stream = self
            .driver
            .acquire()
            .map_err(|err| acquisition_failed(acquisition, err))?;

        let mut position = 0u32;
        for item in stream {
            self.check_cancelled()?;
            let raw = item.map_err(|err| acquisition_failed(acquisition, err))?;
            let bytes = enhance::adjust_page(raw.bytes, self.profile)
                .map_err(|err| acquisition_failed(acquisition, err))?;
            position += 1;
            sequence.push(Page::scanned(bytes, acquisition, position));
            self.collected += 1;
            debug!(acquisition, position, "page materialised");
        }
        Ok(position)
    }

    fn wait_between_scans(&self) -> Result<()> {
        let mut remaining = self.delay;
        while !remaining.is_zero() {
            self.check_cancelled()?;
            let slice = remaining.min(DELAY_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ScanwerkError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn acquisition_failed(acquisition: u32, err: ScanwerkError) -> ScanwerkError {
    match err {
        // Cancellation is not a device failure; let it through unchanged.
        ScanwerkError::Cancelled => ScanwerkError::Cancelled,
        other => ScanwerkError::AcquisitionFailed {
            acquisition,
            detail: other.to_string(),
        },
    }
}
