// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Global seed-search progress and cancellation.
//!
//! Every dataset's search announces its trial count with [`add_total`] and
//! ticks [`advance`] once per trial seed, so a front end polling [`get`]
//! sees one bar across all datasets of a [`hide`](crate::hide). Atomics
//! keep this usable from rayon workers.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::error::StegoError;

static TRIALS: AtomicU32 = AtomicU32::new(0);
static TOTAL: AtomicU32 = AtomicU32::new(0);
static CANCEL: AtomicBool = AtomicBool::new(false);

/// Point-in-time view of the counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub trials: u32,
    /// 0 while no search has announced its size.
    pub total: u32,
}

impl Progress {
    /// Completed share in `0.0..=1.0`, or `None` while the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.trials.min(self.total)) / f64::from(self.total))
    }
}

/// Start a new operation with `total` known trials and clear any pending
/// cancellation.
pub fn init(total: u32) {
    CANCEL.store(false, Ordering::Relaxed);
    TRIALS.store(0, Ordering::Relaxed);
    TOTAL.store(total, Ordering::Relaxed);
}

/// Announce `trials` more trials without resetting the count.
pub fn add_total(trials: u32) {
    TOTAL.fetch_add(trials, Ordering::Relaxed);
}

/// Ask the running search to stop before its next trial.
pub fn cancel() {
    CANCEL.store(true, Ordering::Relaxed);
}

/// Whether [`cancel`] was called since the last [`init`].
pub fn is_cancelled() -> bool {
    CANCEL.load(Ordering::Relaxed)
}

/// Bail out of a cancelled search.
///
/// # Errors
/// [`StegoError::Cancelled`] once [`cancel`] was called.
pub fn check_cancelled() -> Result<(), StegoError> {
    if is_cancelled() {
        Err(StegoError::Cancelled)
    } else {
        Ok(())
    }
}

/// Count one finished trial.
///
/// Stays one short of the total until [`finish`], so a bar never shows
/// complete while the winning seed is still being committed.
pub fn advance() {
    let total = TOTAL.load(Ordering::Relaxed);
    let _ = TRIALS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
        (total == 0 || n + 1 < total).then_some(n + 1)
    });
}

/// `(trials, total)`.
pub fn get() -> (u32, u32) {
    let p = snapshot();
    (p.trials, p.total)
}

/// Current counters as a [`Progress`].
pub fn snapshot() -> Progress {
    Progress {
        trials: TRIALS.load(Ordering::Relaxed),
        total: TOTAL.load(Ordering::Relaxed),
    }
}

/// Mark the operation complete.
pub fn finish() {
    TRIALS.store(TOTAL.load(Ordering::Relaxed), Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The counters are process-global and shared with every embedding test,
    // so only the pure parts are tested here.

    #[test]
    fn fraction_needs_a_total() {
        assert_eq!(Progress { trials: 5, total: 0 }.fraction(), None);
        assert_eq!(Progress { trials: 64, total: 256 }.fraction(), Some(0.25));
        assert_eq!(Progress { trials: 300, total: 256 }.fraction(), Some(1.0));
    }
}
