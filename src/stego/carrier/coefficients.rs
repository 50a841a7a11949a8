// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Quantized transform-coefficient carrier.
//!
//! Coefficients equal to 0 or 1 are left alone: changing them is easy to
//! spot and would change which coefficients carry bits. Every other
//! coefficient carries one bit in its LSB. Small magnitudes are safer to
//! change than large ones.
//!
//! Flipping an LSB moves a coefficient between the values `v` and `v ^ 1`,
//! which skews the coefficient histogram. [`CoefficientPreserver`] undoes the
//! skew: for each change it flips another, unused coefficient the opposite
//! way. Compensations may be deferred while the pending imbalance for a
//! value is small relative to how common that value is, so that a later
//! change in the other direction can cancel it for free.

use std::collections::{BTreeMap, HashMap};

use super::{Carrier, Preserve};
use crate::stego::bitmap::BitSurface;

/// |c| at or above this: changes are conspicuous.
const THRES_MAX: u16 = 0x25;
/// |c| at or above this: neutral.
const THRES_LOW: u16 = 0x04;
/// |c| at or above this: cheap.
const THRES_MIN: u16 = 0x03;

/// Carrier size the frequency thresholds are calibrated for.
const FREQ_RANGE: f64 = 5000.0;
/// Divisor turning a calibrated frequency into a pending threshold.
const FREQ_REDUCE: usize = 33;
/// Smallest pending threshold.
const FREQ_MIN: usize = 2;

fn detect(coeff: i16) -> i8 {
    let magnitude = coeff.unsigned_abs();
    if magnitude >= THRES_MAX {
        -1
    } else if magnitude >= THRES_LOW {
        0
    } else if magnitude >= THRES_MIN {
        1
    } else {
        2
    }
}

fn is_usable(coeff: i16) -> bool {
    coeff & 1 != coeff
}

/// Quantized coefficients in scan order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoefficientCarrier {
    coeffs: Vec<i16>,
}

impl CoefficientCarrier {
    pub fn new(coeffs: Vec<i16>) -> Self {
        Self { coeffs }
    }

    pub fn coefficients(&self) -> &[i16] {
        &self.coeffs
    }

    pub fn into_coefficients(self) -> Vec<i16> {
        self.coeffs
    }
}

impl Carrier for CoefficientCarrier {
    type Preserver = CoefficientPreserver;

    fn bit_surface(&self) -> BitSurface {
        let mut surface = BitSurface::with_capacity(self.coeffs.len());
        for &c in self.coeffs.iter().filter(|&&c| is_usable(c)) {
            surface.push(c & 1 == 1, detect(c), c);
        }
        surface
    }

    fn apply(&mut self, surface: &BitSurface, _mark: bool) {
        let usable = self.coeffs.iter_mut().filter(|c| is_usable(**c));
        for (pos, c) in usable.enumerate().take(surface.bits()) {
            *c = (*c & !1) | surface.bit(pos) as i16;
        }
    }

    fn preserver(&self) -> CoefficientPreserver {
        CoefficientPreserver::default()
    }
}

/// Histogram-preserving compensation for [`CoefficientCarrier`].
#[derive(Clone, Debug, Default)]
pub struct CoefficientPreserver {
    /// Value -> compensations still owed (too many of that value).
    adjust: BTreeMap<i16, usize>,
    /// Value -> how many compensations may stay pending.
    threshold: HashMap<i16, usize>,
    pending: usize,
    corrections: usize,
    failures: usize,
}

impl CoefficientPreserver {
    fn threshold(&self, value: i16) -> usize {
        self.threshold.get(&value).copied().unwrap_or(FREQ_MIN)
    }

    fn owed(&self, value: i16) -> usize {
        self.adjust.get(&value).copied().unwrap_or(0)
    }

    /// Compensations currently deferred.
    pub fn pending(&self) -> usize {
        self.pending
    }
}

/// Flip the nearest free coefficient before `end` that holds `value` to
/// `value ^ 1`, and reserve it.
fn preserve_single(surface: &mut BitSurface, end: usize, value: i16) -> Option<usize> {
    let pos = (0..end).rev().find(|&i| {
        !surface.is_locked(i) && !surface.is_metalocked(i) && surface.data(i) == value
    })?;
    surface.set_data(pos, value ^ 1);
    surface.set_bit(pos, value & 1 == 0);
    surface.set_metalocked(pos, true);
    Some(pos)
}

impl Preserve for CoefficientPreserver {
    fn init(&mut self, surface: &mut BitSurface) -> Option<usize> {
        surface.clear_metalock();
        self.adjust.clear();
        self.pending = 0;
        self.corrections = 0;
        self.failures = 0;

        let bits = surface.bits();
        let mut freq: HashMap<i16, usize> = HashMap::new();
        for &c in surface.data_slice() {
            *freq.entry(c).or_default() += 1;
        }

        let scale = bits as f64 / FREQ_RANGE;
        self.threshold = freq
            .iter()
            .map(|(&v, &n)| {
                let calibrated = (n as f64 / scale) as usize;
                (v, (calibrated / FREQ_REDUCE).max(FREQ_MIN))
            })
            .collect();

        let ones = freq.get(&-1).copied().unwrap_or(0);
        let twos = freq.get(&-2).copied().unwrap_or(0);
        if ones < twos || ones + twos == 0 {
            tracing::debug!(ones, twos, "can not estimate correctable size");
            return None;
        }
        let max = 2 * bits * twos / (ones + twos);
        tracing::debug!(max, bits, "correctable size");
        (max > 0).then_some(max)
    }

    fn preserve(&mut self, surface: &mut BitSurface, pos: usize) -> Option<usize> {
        let original = surface.data(pos);
        let changed_to = original ^ 1;

        // A pending surplus of the value we just lost cancels out.
        if self.owed(original) > 0 {
            *self.adjust.entry(original).or_default() -= 1;
            self.pending -= 1;
            return None;
        }

        if self.owed(changed_to) < self.threshold(changed_to) {
            *self.adjust.entry(changed_to).or_default() += 1;
            self.pending += 1;
            return None;
        }

        if let Some(other) = preserve_single(surface, pos, changed_to) {
            self.corrections += 1;
            return Some(other);
        }

        *self.adjust.entry(changed_to).or_default() += 1;
        self.pending += 1;
        None
    }

    fn finish(&mut self, surface: &mut BitSurface) {
        let owed = std::mem::take(&mut self.adjust);
        let end = surface.bits();
        for (value, count) in owed {
            for _ in 0..count {
                if preserve_single(surface, end, value).is_some() {
                    self.corrections += 1;
                } else {
                    self.failures += 1;
                }
            }
        }
        self.pending = 0;
    }

    fn tally(&self) -> (usize, usize) {
        (self.corrections, self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(values: &[i16]) -> BTreeMap<i16, usize> {
        let mut h = BTreeMap::new();
        for &v in values {
            *h.entry(v).or_default() += 1;
        }
        h
    }

    #[test]
    fn detect_classes() {
        assert_eq!(detect(0x25), -1);
        assert_eq!(detect(-0x30), -1);
        assert_eq!(detect(0x24), 0);
        assert_eq!(detect(4), 0);
        assert_eq!(detect(-3), 1);
        assert_eq!(detect(2), 2);
        assert_eq!(detect(-1), 2);
    }

    #[test]
    fn zero_and_one_carry_nothing() {
        let carrier = CoefficientCarrier::new(vec![0, 1, 2, -1, 0, 3, -2]);
        let s = carrier.bit_surface();
        assert_eq!(s.bits(), 4);
        assert_eq!(s.data_slice(), &[2, -1, 3, -2]);
        assert!(!s.bit(0) && s.bit(1) && s.bit(2) && !s.bit(3));
    }

    #[test]
    fn apply_skips_unusable() {
        let mut carrier = CoefficientCarrier::new(vec![0, 2, 1, -1, 5]);
        let mut s = carrier.bit_surface();
        s.set_bit(0, true);
        s.set_bit(1, false);
        s.set_bit(2, false);
        carrier.apply(&s, false);
        assert_eq!(carrier.coefficients(), &[0, 3, 1, -2, 4]);
        // The set of carrying coefficients is unchanged.
        assert_eq!(carrier.bit_surface().bits(), 3);
    }

    #[test]
    fn correctable_estimate() {
        let mut coeffs = vec![-1i16; 30];
        coeffs.extend([-2i16; 10]);
        coeffs.extend([7i16; 60]);
        let mut s = CoefficientCarrier::new(coeffs).bit_surface();
        let mut p = CoefficientPreserver::default();
        assert_eq!(p.init(&mut s), Some(50));
        // 30 of 100 at the 5000-bit calibration, reduced by 33.
        assert_eq!(p.threshold(-1), 45);
        assert_eq!(p.threshold(99), FREQ_MIN);
    }

    #[test]
    fn no_estimate_when_minus_two_dominates() {
        let mut s = CoefficientCarrier::new(vec![-2, -2, -1, 5]).bit_surface();
        assert_eq!(CoefficientPreserver::default().init(&mut s), None);
        let mut s = CoefficientCarrier::new(vec![5, 6]).bit_surface();
        assert_eq!(CoefficientPreserver::default().init(&mut s), None);
    }

    #[test]
    fn preserve_single_finds_nearest_earlier() {
        let mut s = CoefficientCarrier::new(vec![3, 3, 5, 3, 8]).bit_surface();
        s.set_locked(3, true);
        assert_eq!(preserve_single(&mut s, 4, 3), Some(1));
        assert_eq!(s.data(1), 2);
        assert!(!s.bit(1));
        assert!(s.is_metalocked(1));
        assert_eq!(preserve_single(&mut s, 4, 3), Some(0));
        assert_eq!(preserve_single(&mut s, 4, 3), None);
    }

    #[test]
    fn defers_then_compensates() {
        let mut coeffs = vec![3i16, 3, 3, 5, 5, 2, 2, 2, 2, 2];
        coeffs.extend(std::iter::repeat(40).take(9990));
        let carrier = CoefficientCarrier::new(coeffs);
        let mut s = carrier.bit_surface();
        let mut p = carrier.preserver();
        p.init(&mut s);

        // Embed 2 -> 3 at positions 5, 6 and 7.
        for pos in [5, 6, 7] {
            s.set_locked(pos, true);
            s.set_bit(pos, true);
        }
        assert_eq!(p.preserve(&mut s, 5), None);
        assert_eq!(p.preserve(&mut s, 6), None);
        assert_eq!(p.pending(), 2);
        assert_eq!(p.preserve(&mut s, 7), Some(2));
        assert_eq!(p.tally(), (1, 0));

        p.finish(&mut s);
        assert_eq!(p.tally(), (3, 0));
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn opposite_change_cancels_pending() {
        let mut coeffs = vec![3i16, 2, 2, 3];
        coeffs.extend(std::iter::repeat(40).take(996));
        let carrier = CoefficientCarrier::new(coeffs);
        let mut s = carrier.bit_surface();
        let mut p = carrier.preserver();
        p.init(&mut s);

        // 2 -> 3 at 1 defers; 3 -> 2 at 3 cancels it.
        assert_eq!(p.preserve(&mut s, 1), None);
        assert_eq!(p.pending(), 1);
        assert_eq!(p.preserve(&mut s, 3), None);
        assert_eq!(p.pending(), 0);
        p.finish(&mut s);
        assert_eq!(p.tally(), (0, 0));
    }

    #[test]
    fn finish_counts_failures() {
        let carrier = CoefficientCarrier::new(vec![2, 2, 40, 40]);
        let mut s = carrier.bit_surface();
        let mut p = carrier.preserver();
        p.init(&mut s);
        for pos in [0, 1] {
            s.set_locked(pos, true);
        }
        p.preserve(&mut s, 0);
        p.preserve(&mut s, 1);
        p.finish(&mut s);
        // No free coefficient holds a 3.
        assert_eq!(p.tally(), (0, 2));
    }

    #[test]
    fn foil_keeps_histogram() {
        let mut coeffs = vec![3i16, 3, 3, 5, 5, 2, 2, 2, 2, 2];
        coeffs.extend(std::iter::repeat(40).take(9990));
        let mut carrier = CoefficientCarrier::new(coeffs);
        let before = histogram(carrier.coefficients());
        let mut s = carrier.bit_surface();
        let mut p = carrier.preserver();
        p.init(&mut s);
        for pos in [5, 6, 7] {
            s.set_locked(pos, true);
            s.set_bit(pos, true);
            p.preserve(&mut s, pos);
        }
        p.finish(&mut s);
        carrier.apply(&s, false);
        assert_eq!(histogram(carrier.coefficients()), before);
        assert_eq!(&carrier.coefficients()[5..8], &[3, 3, 3]);
    }
}
