// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Seed search.
//!
//! The 16-bit seed only changes where payload bits land, so different seeds
//! need different numbers of changes. The search runs a trial placement for
//! every seed in a [`SeedRange`] against the untouched surface and keeps
//! the one with the lowest cost (`changed + bias`), breaking ties towards
//! the lowest seed.
//!
//! A [`FailureKind::Permanent`] trial ends the search at once: no other
//! seed can do better. If every trial fails otherwise, the search reports
//! a body failure when any trial got past the header, and a header failure
//! when none did.
//!
//! With the `parallel` feature the trials run on the rayon pool. Results
//! are reduced in seed order, so the chosen seed is the same either way.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::bitmap::BitSurface;
use super::embed::{place, EmbedJob, FailureKind, Outcome, Target};
use super::error::StegoError;
use super::progress;

/// Seeds tried when the caller does not say otherwise.
pub const DEFAULT_SEED_LIMIT: u32 = 256;

/// One past the largest seed the header can carry.
const SEED_SPACE: u32 = 1 << 16;

/// Half-open range of seeds `start..limit`, always inside the 16-bit seed
/// space.
///
/// An empty range bypasses the search and embeds with `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedRange {
    start: u32,
    limit: u32,
}

impl Default for SeedRange {
    fn default() -> Self {
        Self { start: 0, limit: DEFAULT_SEED_LIMIT }
    }
}

impl SeedRange {
    /// Range clamped to the 16-bit seed space.
    pub fn new(start: u32, limit: u32) -> Self {
        Self {
            start: start.min(SEED_SPACE - 1),
            limit: limit.min(SEED_SPACE),
        }
    }

    /// Skip the search and use `seed`.
    pub fn fixed(seed: u16) -> Self {
        Self { start: seed as u32, limit: seed as u32 }
    }

    /// First seed tried.
    pub fn start(&self) -> u16 {
        self.start as u16
    }

    /// One past the last seed tried.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether the search is bypassed.
    pub fn is_fixed(&self) -> bool {
        self.limit <= self.start
    }

    /// Seeds to try, in order.
    fn seeds(&self) -> std::ops::Range<u32> {
        if self.is_fixed() {
            self.start..self.start + 1
        } else {
            self.start..self.limit
        }
    }
}

/// Spread of the change counts over the successful trials.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// `(changed, fraction of successful trials)` for every count from min to max.
    pub histogram: Vec<(usize, f64)>,
}

/// Winning seed and what it costs.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub seed: u16,
    pub outcome: Outcome,
    pub trials: usize,
    pub successes: usize,
    pub stats: Option<SearchStats>,
}

type Trial = (u16, Result<Outcome, FailureKind>);

fn run_trial(surface: &BitSurface, job: &EmbedJob, seed: u32) -> Result<Trial, StegoError> {
    progress::check_cancelled()?;
    let seed = seed as u16;
    let result = place(Target::Trial(surface), job, seed);
    tracing::trace!(seed, ?result, "trial");
    progress::advance();
    Ok((seed, result))
}

#[cfg(not(feature = "parallel"))]
fn run_trials(
    surface: &BitSurface,
    job: &EmbedJob,
    range: SeedRange,
) -> Result<Vec<Trial>, StegoError> {
    let mut trials = Vec::with_capacity(range.seeds().len());
    for seed in range.seeds() {
        let trial = run_trial(surface, job, seed)?;
        let permanent = trial.1 == Err(FailureKind::Permanent);
        trials.push(trial);
        if permanent {
            break;
        }
    }
    Ok(trials)
}

#[cfg(feature = "parallel")]
fn run_trials(
    surface: &BitSurface,
    job: &EmbedJob,
    range: SeedRange,
) -> Result<Vec<Trial>, StegoError> {
    range
        .seeds()
        .into_par_iter()
        .map(|seed| run_trial(surface, job, seed))
        .collect()
}

/// Find the cheapest seed in `range` for `job` on `surface`.
///
/// # Errors
/// - [`StegoError::CapacityExceeded`] if the carrier can't hold the job.
/// - [`StegoError::HeaderPlacementFailed`] / [`StegoError::BodyPlacementFailed`]
///   if no seed in the range works.
/// - [`StegoError::Cancelled`] if [`progress::cancel`] was called.
pub fn search(
    surface: &BitSurface,
    job: &EmbedJob,
    range: SeedRange,
    collect_stats: bool,
) -> Result<SearchResult, StegoError> {
    progress::add_total(range.seeds().len() as u32);
    let trials = run_trials(surface, job, range)?;

    if trials.iter().any(|(_, r)| *r == Err(FailureKind::Permanent)) {
        return Err(FailureKind::Permanent.into_error(job, surface.bits()));
    }

    let mut best: Option<(u16, Outcome)> = None;
    for (seed, result) in &trials {
        let Ok(outcome) = result else { continue };
        if best.map_or(true, |(_, b)| outcome.cost() < b.cost()) {
            tracing::info!(
                seed,
                cost = outcome.cost(),
                changed = outcome.changed,
                bias = outcome.bias,
                "new best seed"
            );
            best = Some((*seed, *outcome));
        }
    }

    let Some((seed, outcome)) = best else {
        let kind = if trials.iter().any(|(_, r)| *r == Err(FailureKind::Body)) {
            FailureKind::Body
        } else {
            FailureKind::Header
        };
        return Err(kind.into_error(job, surface.bits()));
    };

    let changes: Vec<usize> = trials
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok().map(|o| o.changed))
        .collect();
    let stats = if collect_stats { change_stats(&changes) } else { None };
    if let Some(s) = &stats {
        tracing::debug!(min = s.min, max = s.max, mean = s.mean, std_dev = s.std_dev, "seed stats");
    }

    Ok(SearchResult {
        seed,
        outcome,
        trials: trials.len(),
        successes: changes.len(),
        stats,
    })
}

/// Statistics over change counts; `None` unless they spread by more than one.
fn change_stats(changes: &[usize]) -> Option<SearchStats> {
    let min = *changes.iter().min()?;
    let max = *changes.iter().max()?;
    if max - min <= 1 {
        return None;
    }

    let n = changes.len() as f64;
    let mean = changes.iter().sum::<usize>() as f64 / n;
    let var = changes.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0);

    let mut counts = vec![0usize; max - min + 1];
    for &c in changes {
        counts[c - min] += 1;
    }
    let histogram = counts
        .iter()
        .enumerate()
        .map(|(i, &k)| (min + i, k as f64 / n))
        .collect();

    Some(SearchStats { min, max, mean, std_dev: var.sqrt(), histogram })
}
