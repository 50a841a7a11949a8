// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Embedding and extraction pipelines.
//!
//! [`embed`] is the surface-level entry point: frame the message, search
//! the seed range for the cheapest placement, then commit it. Several
//! datasets can go into one surface in turn; bits committed by an earlier
//! dataset stay locked, so later ones should use error correction to
//! absorb collisions.
//!
//! [`hide`] and [`reveal`] wrap the same steps around a [`Carrier`]:
//! 1. Build the bit surface from the media.
//! 2. Let the carrier's preserver gather statistics (with foiling on).
//! 3. Embed each dataset, retrying with derived keys if asked to.
//! 4. Run the foil pass.
//! 5. Write the surface back into the media.

use super::bitmap::BitSurface;
use super::capacity;
use super::carrier::{Carrier, Preserve};
use super::embed::{place, EmbedJob, Target};
use super::error::StegoError;
use super::foil::{foil, FoilReport};
use super::progress;
use super::search::{search, SearchStats, SeedRange};

/// Settings for one embedding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbedConfig {
    /// Golay-protect header and payload.
    pub error_correction: bool,
    /// Seeds to try; an empty range embeds with its start seed.
    pub seeds: SeedRange,
    /// Collect [`SearchStats`] over the trials.
    pub collect_stats: bool,
}

/// What an embedding did to the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedReport {
    /// Key the data was embedded under (differs from the caller's key after
    /// a derivation retry).
    pub key: Vec<u8>,
    pub seed: u16,
    pub changed: usize,
    pub bias: i64,
    /// Framed payload size in bytes.
    pub encoded_len: usize,
    /// Header and payload bits placed.
    pub bits_embedded: usize,
    pub stats: Option<SearchStats>,
}

/// Embed `message` into `surface` under `key`.
///
/// # Errors
/// - [`StegoError::MessageTooLarge`] if the message exceeds 65535 bytes.
/// - [`StegoError::CapacityExceeded`] if the surface is too small.
/// - [`StegoError::HeaderPlacementFailed`] / [`StegoError::BodyPlacementFailed`]
///   if no seed in the range works.
/// - [`StegoError::Cancelled`] if cancelled through [`progress::cancel`].
pub fn embed(
    surface: &mut BitSurface,
    key: &[u8],
    message: &[u8],
    config: &EmbedConfig,
) -> Result<EmbedReport, StegoError> {
    progress::init(0);
    let result = embed_one(surface, key, message, config, None);
    progress::finish();
    result
}

/// Like [`embed`], but on a key-specific failure retries with the derived
/// keys `key‖"1"` through `key‖derivations`.
///
/// # Errors
/// The error of the last attempt, or the first error that no other key can
/// fix.
pub fn embed_with_derivations(
    surface: &mut BitSurface,
    key: &[u8],
    message: &[u8],
    config: &EmbedConfig,
    derivations: u32,
) -> Result<EmbedReport, StegoError> {
    progress::init(0);
    let result = embed_derived(surface, key, message, config, derivations, None);
    progress::finish();
    result
}

/// Recover the message embedded in `surface` under `key`.
///
/// # Errors
/// See [`extract`](super::extract::extract).
pub fn extract(
    surface: &BitSurface,
    key: &[u8],
    error_correction: bool,
) -> Result<Vec<u8>, StegoError> {
    super::extract::extract(surface, key, error_correction)
}

/// `key` for attempt `n`: the key itself, then the key with `n` appended.
fn derived_key(key: &[u8], n: u32) -> Vec<u8> {
    let mut derived = key.to_vec();
    if n > 0 {
        derived.extend_from_slice(n.to_string().as_bytes());
    }
    derived
}

/// Failures another key might avoid.
fn is_key_specific(error: &StegoError) -> bool {
    matches!(
        error,
        StegoError::HeaderPlacementFailed
            | StegoError::BodyPlacementFailed
            | StegoError::CapacityExceeded { .. }
    )
}

fn embed_derived(
    surface: &mut BitSurface,
    key: &[u8],
    message: &[u8],
    config: &EmbedConfig,
    derivations: u32,
    max_correctable: Option<usize>,
) -> Result<EmbedReport, StegoError> {
    let mut attempt = 0;
    loop {
        let candidate = derived_key(key, attempt);
        match embed_one(surface, &candidate, message, config, max_correctable) {
            Err(e) if attempt < derivations && is_key_specific(&e) => {
                tracing::warn!(attempt, error = %e, "embedding failed, deriving next key");
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn embed_one(
    surface: &mut BitSurface,
    key: &[u8],
    message: &[u8],
    config: &EmbedConfig,
    max_correctable: Option<usize>,
) -> Result<EmbedReport, StegoError> {
    let ecc = config.error_correction;
    let job = EmbedJob::new(key, message, ecc)?;
    tracing::debug!(
        len = message.len(),
        encoded_len = job.encoded_len(),
        bits = job.encoded_len() * 8,
        error_correction = ecc,
        "encoded payload"
    );
    capacity::check_correctable(job.encoded_len(), ecc, max_correctable)?;

    let found = search(surface, &job, config.seeds, config.collect_stats)?;
    let available = surface.bits();
    let outcome = place(Target::Commit(surface), &job, found.seed)
        .map_err(|kind| kind.into_error(&job, available))?;
    debug_assert_eq!(outcome, found.outcome);

    tracing::info!(
        seed = found.seed,
        changed = outcome.changed,
        bias = outcome.bias,
        "embedding committed"
    );
    tracing::debug!(
        bits_embedded = outcome.bits_embedded,
        end_offset = outcome.end_offset,
        available,
        "embedding accounting"
    );

    Ok(EmbedReport {
        key: key.to_vec(),
        seed: found.seed,
        changed: outcome.changed,
        bias: outcome.bias,
        encoded_len: job.encoded_len(),
        bits_embedded: outcome.bits_embedded,
        stats: found.stats,
    })
}

/// One message to hide, with its own key and error-correction choice.
#[derive(Clone, Copy, Debug)]
pub struct Dataset<'a> {
    pub key: &'a [u8],
    pub message: &'a [u8],
    pub error_correction: bool,
}

/// Settings for [`hide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HideOptions {
    /// Make every slot holding an embedded bit conspicuous (debugging aid).
    pub mark: bool,
    /// Run the statistics-preserving foil pass.
    pub foil: bool,
    /// Derived keys to try per dataset after the plain key fails.
    pub derivations: u32,
    pub seeds: SeedRange,
    pub collect_stats: bool,
}

impl Default for HideOptions {
    fn default() -> Self {
        Self {
            mark: false,
            foil: true,
            derivations: 0,
            seeds: SeedRange::default(),
            collect_stats: false,
        }
    }
}

/// Outcome of [`hide`].
#[derive(Clone, Debug, PartialEq)]
pub struct HideReport {
    pub datasets: Vec<EmbedReport>,
    /// Correctable message size reported by the preserver, in bits.
    pub correctable: Option<usize>,
    pub foil: Option<FoilReport>,
}

impl HideReport {
    /// Changed bits over all datasets.
    pub fn changed(&self) -> usize {
        self.datasets.iter().map(|d| d.changed).sum()
    }

    /// Bias over all datasets.
    pub fn bias(&self) -> i64 {
        self.datasets.iter().map(|d| d.bias).sum()
    }
}

/// Hide `datasets` in `carrier`, in order.
///
/// Nothing is written to the carrier unless every dataset was embedded.
///
/// # Errors
/// The first dataset error; see [`embed`] and [`embed_with_derivations`].
/// [`StegoError::CorrectableSizeExceeded`] if foiling is on and a message is
/// larger than the carrier's preserver can compensate.
pub fn hide<C: Carrier>(
    carrier: &mut C,
    datasets: &[Dataset<'_>],
    options: &HideOptions,
) -> Result<HideReport, StegoError> {
    progress::init(0);
    let result = hide_all(carrier, datasets, options);
    progress::finish();
    result
}

fn hide_all<C: Carrier>(
    carrier: &mut C,
    datasets: &[Dataset<'_>],
    options: &HideOptions,
) -> Result<HideReport, StegoError> {
    let mut surface = carrier.bit_surface();
    tracing::info!(bits = surface.bits(), "usable carrier bits");

    let mut preserver = carrier.preserver();
    let correctable = if options.foil { preserver.init(&mut surface) } else { None };
    if let Some(max) = correctable {
        tracing::info!(
            max,
            percent = 100.0 * max as f64 / surface.bits().max(1) as f64,
            "correctable message size"
        );
    }

    let mut reports = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let config = EmbedConfig {
            error_correction: dataset.error_correction,
            seeds: options.seeds,
            collect_stats: options.collect_stats,
        };
        let report = embed_derived(
            &mut surface,
            dataset.key,
            dataset.message,
            &config,
            options.derivations,
            correctable,
        )?;
        reports.push(report);
    }

    let foil_report = options.foil.then(|| foil(&mut surface, &mut preserver));
    let report = HideReport { datasets: reports, correctable, foil: foil_report };
    tracing::info!(
        total = report.changed() as i64 + report.bias(),
        changed = report.changed(),
        bias = report.bias(),
        "total bits changed"
    );

    carrier.apply(&surface, options.mark);
    Ok(report)
}

/// Recover the message hidden in `carrier` under `key`.
///
/// # Errors
/// See [`extract`].
pub fn reveal<C: Carrier>(
    carrier: &C,
    key: &[u8],
    error_correction: bool,
) -> Result<Vec<u8>, StegoError> {
    extract(&carrier.bit_surface(), key, error_correction)
}
