// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Statistics foiling pass.
//!
//! Runs after every dataset is embedded. Each locked bit that differs from
//! its original datum is handed to the carrier's [`Preserve`]r, which
//! compensates it elsewhere. The distance between a change and its
//! compensation is collected into a histogram so callers can judge how far
//! the preserver had to look.

use super::bitmap::BitSurface;
use super::carrier::Preserve;

/// Offsets at or beyond this share the last histogram bucket.
pub const MAX_SEEK: usize = 1024;

/// Summary of a foil pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FoilReport {
    pub corrections: usize,
    pub failures: usize,
    /// Mean distance between a change and its immediate compensation.
    pub mean_offset: f64,
    /// Sample standard deviation of that distance.
    pub std_dev: f64,
    /// `offsets[n - 1]` = compensations found `n` positions away.
    pub offsets: Vec<usize>,
}

/// Compensate every embedded change on `surface`.
pub fn foil<P: Preserve>(surface: &mut BitSurface, preserver: &mut P) -> FoilReport {
    let mut offsets = vec![0usize; MAX_SEEK];

    for pos in 0..surface.bits() {
        if !surface.is_locked(pos) {
            continue;
        }
        if surface.bit(pos) == (surface.data(pos) & 1 == 1) {
            continue;
        }
        if let Some(other) = preserver.preserve(surface, pos) {
            let distance = pos.abs_diff(other).clamp(1, MAX_SEEK);
            offsets[distance - 1] += 1;
        }
    }
    preserver.finish(surface);

    let count: usize = offsets.iter().sum();
    let mut mean_offset = 0.0;
    let mut std_dev = 0.0;
    if count > 0 {
        mean_offset = offsets
            .iter()
            .enumerate()
            .map(|(i, &k)| k as f64 * (i + 1) as f64)
            .sum::<f64>()
            / count as f64;
    }
    if count > 1 {
        let dev: f64 = offsets
            .iter()
            .enumerate()
            .map(|(i, &k)| k as f64 * ((i + 1) as f64 - mean_offset).powi(2))
            .sum();
        std_dev = (dev / (count - 1) as f64).sqrt();
    }

    let (corrections, failures) = preserver.tally();
    tracing::debug!(corrections, failures, mean_offset, std_dev, "foiling statistics");
    FoilReport { corrections, failures, mean_offset, std_dev, offsets }
}
