// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Bias correction for error-corrected windows.
//!
//! A 23-bit Golay codeword decodes correctly with up to three wrong bits.
//! Once a window is placed, the flips that were actually written can be
//! partly undone: the budget is three minus the locked mismatches the
//! window already had to leave wrong. The most conspicuous flips (highest
//! detectability class) are reverted first.

use std::cmp::Reverse;

use super::embed::Target;
use super::golay::ERRORBITS;

/// What a window correction undid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Correction {
    pub reverted: usize,
    /// Sum of the detectability classes of the reverted flips.
    pub bias: i64,
}

/// Revert up to `3 - errors` of `flips`, highest detectability first.
///
/// Ties keep placement order. Trials only account; commits unlock the slot
/// and restore its bit.
pub(crate) fn correct_window(target: &mut Target<'_>, flips: &[usize], errors: u32) -> Correction {
    let budget = ERRORBITS.saturating_sub(errors) as usize;
    let mut order = flips.to_vec();
    {
        let surface = target.surface();
        order.sort_by_key(|&pos| Reverse(surface.detect(pos)));
    }
    order.truncate(budget);

    let mut correction = Correction::default();
    for pos in order {
        correction.bias += target.surface().detect(pos) as i64;
        correction.reverted += 1;
        target.revert(pos);
    }
    correction
}
