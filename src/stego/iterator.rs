// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Keyed pseudo-random walk over carrier bit positions.
//!
//! The iterator starts at a random offset below [`INIT_SKIPMOD`] and moves
//! forward by `1 + (word mod skip_mod)` on every step, where `word` comes
//! from the Seeding [`Keystream`]. Positions are therefore strictly
//! increasing, so a single walk never visits a bit twice.
//!
//! The step width is retuned between bytes with [`BitIterator::adapt`] so the
//! payload is spread over the remaining carrier. Near the end of the carrier
//! the width tapers down so the walk does not overshoot:
//!
//! ```text
//! taper(x, y) = 2                 if y > x/32
//!             = 1 + y / (x/32)    otherwise
//! ```
//!
//! where `x` is the carrier size and `y` the number of bits left after the
//! current offset.

use super::keystream::{Keystream, SEEDING};

/// Skip modulus used before the header is fitted to the carrier.
pub const INIT_SKIPMOD: u32 = 32;

/// Position cursor driven by the Seeding keystream.
#[derive(Clone)]
pub struct BitIterator {
    stream: Keystream,
    skip_mod: u32,
    offset: usize,
}

impl BitIterator {
    /// Start a walk for `key`.
    pub fn new(key: &[u8]) -> Self {
        let mut stream = Keystream::new(SEEDING, key);
        let offset = (stream.next_word() % INIT_SKIPMOD) as usize;
        Self { stream, skip_mod: INIT_SKIPMOD, offset }
    }

    /// Current bit position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current step width: [`advance`](Self::advance) moves by `1..=skip_modulus`.
    pub fn skip_modulus(&self) -> u32 {
        self.skip_mod
    }

    /// Step to the next position and return it.
    pub fn advance(&mut self) -> usize {
        let step = self.stream.next_word() % self.skip_mod;
        self.offset += step as usize + 1;
        self.offset
    }

    /// Mix the 16-bit embedding seed into the position stream.
    ///
    /// The current offset is kept; only future steps change.
    pub fn reseed(&mut self, seed: u16) {
        self.stream.mix_in(&seed.to_le_bytes());
    }

    /// Set the skip modulus used while the header is placed.
    ///
    /// A full-size modulus would walk off a small carrier before the header
    /// is down, so it shrinks to leave each header bit about four slots.
    pub fn fit_header(&mut self, total_bits: usize, header_bits: usize) {
        let per_bit = total_bits / (4 * header_bits.max(1));
        self.skip_mod = per_bit.clamp(1, INIT_SKIPMOD as usize) as u32;
    }

    /// Retune the skip modulus to spread `remaining_bytes` over what is left.
    ///
    /// Does nothing when no bytes remain.
    pub fn adapt(&mut self, total_bits: usize, remaining_bytes: usize) {
        if remaining_bytes == 0 {
            return;
        }
        let remaining_bits = total_bits.saturating_sub(self.offset);
        let width = taper(total_bits, remaining_bits) * remaining_bits as f64
            / (8 * remaining_bytes) as f64;
        self.skip_mod = (width as u32).max(1);
    }
}

/// Spread factor in `[1, 2]`, dropping towards 1 over the last 1/32 of the carrier.
fn taper(total_bits: usize, remaining_bits: usize) -> f64 {
    let tail = total_bits / 32;
    if tail == 0 || remaining_bits > tail {
        2.0
    } else {
        1.0 + remaining_bits as f64 / tail as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_below_initial_modulus() {
        for key in [&b"a"[..], b"bb", b"secret", b""] {
            let it = BitIterator::new(key);
            assert!(it.offset() < INIT_SKIPMOD as usize);
            assert_eq!(it.skip_modulus(), INIT_SKIPMOD);
        }
    }

    #[test]
    fn advance_is_strictly_increasing_and_bounded() {
        let mut it = BitIterator::new(b"walk");
        let mut last = it.offset();
        for _ in 0..1000 {
            let next = it.advance();
            assert!(next > last);
            assert!(next - last <= INIT_SKIPMOD as usize);
            last = next;
        }
    }

    #[test]
    fn same_key_same_walk() {
        let mut a = BitIterator::new(b"k");
        let mut b = BitIterator::new(b"k");
        for _ in 0..100 {
            assert_eq!(a.advance(), b.advance());
        }
    }

    #[test]
    fn reseed_keeps_offset_but_changes_walk() {
        let base = BitIterator::new(b"k");
        let mut a = base.clone();
        let mut b = base.clone();
        b.reseed(7);
        assert_eq!(a.offset(), b.offset());
        let wa: Vec<_> = (0..32).map(|_| a.advance()).collect();
        let wb: Vec<_> = (0..32).map(|_| b.advance()).collect();
        assert_ne!(wa, wb);
    }

    #[test]
    fn different_seeds_differ() {
        let base = BitIterator::new(b"k");
        let mut a = base.clone();
        let mut b = base;
        a.reseed(1);
        b.reseed(256);
        let wa: Vec<_> = (0..32).map(|_| a.advance()).collect();
        let wb: Vec<_> = (0..32).map(|_| b.advance()).collect();
        assert_ne!(wa, wb);
    }

    #[test]
    fn modulus_one_steps_by_one() {
        let mut it = BitIterator::new(b"k");
        it.fit_header(8, 32);
        assert_eq!(it.skip_modulus(), 1);
        let start = it.offset();
        assert_eq!(it.advance(), start + 1);
        assert_eq!(it.advance(), start + 2);
    }

    #[test]
    fn header_fit_is_clamped() {
        let mut it = BitIterator::new(b"k");
        it.fit_header(1_000_000, 32);
        assert_eq!(it.skip_modulus(), 32);
        it.fit_header(256, 32);
        assert_eq!(it.skip_modulus(), 2);
        it.fit_header(4096, 32);
        assert_eq!(it.skip_modulus(), 32);
        it.fit_header(0, 32);
        assert_eq!(it.skip_modulus(), 1);
    }

    #[test]
    fn taper_range() {
        assert_eq!(taper(3200, 3000), 2.0);
        assert_eq!(taper(3200, 100), 2.0);
        assert_eq!(taper(3200, 50), 1.5);
        assert_eq!(taper(3200, 0), 1.0);
        assert_eq!(taper(16, 3), 2.0);
    }

    #[test]
    fn adapt_spreads_over_remaining_bits() {
        let mut it = BitIterator::new(b"k");
        let off = it.offset();
        let total = 100_000;
        it.adapt(total, 10);
        let expected = (2.0 * (total - off) as f64 / 80.0) as u32;
        assert_eq!(it.skip_modulus(), expected);
    }

    #[test]
    fn adapt_never_drops_below_one() {
        let mut it = BitIterator::new(b"k");
        it.adapt(10, 1000);
        assert_eq!(it.skip_modulus(), 1);
        // Offset beyond the carrier: no bits remain.
        for _ in 0..10 {
            it.advance();
        }
        it.adapt(4, 1);
        assert_eq!(it.skip_modulus(), 1);
    }

    #[test]
    fn adapt_with_nothing_left_is_noop() {
        let mut it = BitIterator::new(b"k");
        it.fit_header(400, 32);
        let before = it.skip_modulus();
        it.adapt(100_000, 0);
        assert_eq!(it.skip_modulus(), before);
    }
}
