// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Carrier adapters.
//!
//! A [`Carrier`] turns its media (pixel samples, quantized transform
//! coefficients) into a [`BitSurface`] and writes an embedded surface back.
//! The embedding engine never sees the media itself.
//!
//! Carriers whose statistics an attacker can check (coefficient histograms)
//! also hand out a [`Preserve`] implementation that compensates every
//! embedded change by a matching change elsewhere.

pub mod coefficients;
pub mod samples;

pub use coefficients::{CoefficientCarrier, CoefficientPreserver};
pub use samples::SampleCarrier;

use super::bitmap::BitSurface;

/// Statistics preservation hooks driven by the foil pass.
pub trait Preserve {
    /// Gather per-carrier statistics before anything is embedded.
    ///
    /// Returns the largest correctable message in bits, or `None` if there
    /// is no limit (or it can't be estimated).
    fn init(&mut self, surface: &mut BitSurface) -> Option<usize>;

    /// Compensate the change at `pos`.
    ///
    /// Returns the position that was changed in exchange, if one was
    /// changed right away.
    fn preserve(&mut self, surface: &mut BitSurface, pos: usize) -> Option<usize>;

    /// Settle whatever compensation is still pending.
    fn finish(&mut self, surface: &mut BitSurface);

    /// `(corrections, failures)` so far.
    fn tally(&self) -> (usize, usize);
}

/// Preserver for carriers without checkable statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPreserve;

impl Preserve for NoPreserve {
    fn init(&mut self, _surface: &mut BitSurface) -> Option<usize> {
        None
    }

    fn preserve(&mut self, _surface: &mut BitSurface, _pos: usize) -> Option<usize> {
        None
    }

    fn finish(&mut self, _surface: &mut BitSurface) {}

    fn tally(&self) -> (usize, usize) {
        (0, 0)
    }
}

/// Media that can carry embedded bits.
pub trait Carrier {
    type Preserver: Preserve;

    /// Build the bit surface of the current media.
    fn bit_surface(&self) -> BitSurface;

    /// Write the bits of `surface` back into the media.
    ///
    /// With `mark`, every slot holding an embedded (locked) bit is made
    /// visibly conspicuous where the media allows it.
    fn apply(&mut self, surface: &BitSurface, mark: bool);

    /// A fresh preserver for this carrier.
    fn preserver(&self) -> Self::Preserver;
}
