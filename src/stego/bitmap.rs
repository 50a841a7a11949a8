// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Carrier bit-surface.
//!
//! A [`BitSurface`] is the format-independent view of a carrier: one slot per
//! usable low-order bit, with five parallel arrays indexed by bit position.
//!
//! | array      | packing      | meaning                                           |
//! |------------|--------------|---------------------------------------------------|
//! | `bitmap`   | 1 bit/slot   | current bit value                                 |
//! | `locked`   | 1 bit/slot   | committed by an embedding, not to be rewritten    |
//! | `metalock` | 1 bit/slot   | consumed by the statistics-preserving foil pass   |
//! | `detect`   | 1 i8/slot    | detectability class, -1 (conspicuous) ..= 2 (safe)|
//! | `data`     | 1 i16/slot   | original sample/coefficient value                 |
//!
//! Carrier adapters fill it (possibly incrementally with [`BitSurface::push`]),
//! the embedder mutates it in place and the extractor only reads it.

/// Number of run-length buckets in a [`BitHistogram`]; longer runs share the last.
pub const MAX_RUN_LEN: usize = 25;

#[inline]
fn test_bit(bytes: &[u8], pos: usize) -> bool {
    bytes[pos / 8] & (1 << (pos & 7)) != 0
}

#[inline]
fn write_bit(bytes: &mut [u8], pos: usize, value: bool) {
    let mask = 1u8 << (pos & 7);
    if value {
        bytes[pos / 8] |= mask;
    } else {
        bytes[pos / 8] &= !mask;
    }
}

/// Bit-level view of a carrier with its embedding bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitSurface {
    bitmap: Vec<u8>,
    locked: Vec<u8>,
    metalock: Vec<u8>,
    detect: Vec<i8>,
    data: Vec<i16>,
    bits: usize,
}

impl BitSurface {
    /// An all-zero surface of `bits` slots with neutral detectability.
    pub fn new(bits: usize) -> Self {
        let bytes = bits.div_ceil(8);
        Self {
            bitmap: vec![0; bytes],
            locked: vec![0; bytes],
            metalock: vec![0; bytes],
            detect: vec![0; bits],
            data: vec![0; bits],
            bits,
        }
    }

    /// An empty surface with room for `bits` slots before reallocating.
    pub fn with_capacity(bits: usize) -> Self {
        let bytes = bits.div_ceil(8);
        Self {
            bitmap: Vec::with_capacity(bytes),
            locked: Vec::with_capacity(bytes),
            metalock: Vec::with_capacity(bytes),
            detect: Vec::with_capacity(bits),
            data: Vec::with_capacity(bits),
            bits: 0,
        }
    }

    /// Append one slot holding `value`, unlocked.
    pub fn push(&mut self, value: bool, detect: i8, data: i16) {
        if self.bits % 8 == 0 {
            self.bitmap.push(0);
            self.locked.push(0);
            self.metalock.push(0);
        }
        write_bit(&mut self.bitmap, self.bits, value);
        self.detect.push(detect);
        self.data.push(data);
        self.bits += 1;
    }

    /// Number of usable bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Size of the packed bitmap in bytes.
    pub fn bytes(&self) -> usize {
        self.bitmap.len()
    }

    /// True for a carrier with no usable bits.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Current value of bit `pos`.
    pub fn bit(&self, pos: usize) -> bool {
        test_bit(&self.bitmap, pos)
    }

    /// Overwrite bit `pos`. Locks are left alone.
    pub fn set_bit(&mut self, pos: usize, value: bool) {
        write_bit(&mut self.bitmap, pos, value);
    }

    pub fn is_locked(&self, pos: usize) -> bool {
        test_bit(&self.locked, pos)
    }

    pub fn set_locked(&mut self, pos: usize, value: bool) {
        write_bit(&mut self.locked, pos, value);
    }

    pub fn is_metalocked(&self, pos: usize) -> bool {
        test_bit(&self.metalock, pos)
    }

    pub fn set_metalocked(&mut self, pos: usize, value: bool) {
        write_bit(&mut self.metalock, pos, value);
    }

    /// Forget every foil reservation.
    pub fn clear_metalock(&mut self) {
        self.metalock.iter_mut().for_each(|b| *b = 0);
    }

    pub fn detect(&self, pos: usize) -> i8 {
        self.detect[pos]
    }

    pub fn set_detect(&mut self, pos: usize, class: i8) {
        self.detect[pos] = class;
    }

    pub fn data(&self, pos: usize) -> i16 {
        self.data[pos]
    }

    pub fn set_data(&mut self, pos: usize, value: i16) {
        self.data[pos] = value;
    }

    /// All original values, one per slot.
    pub fn data_slice(&self) -> &[i16] {
        &self.data
    }

    /// Packed current bits, LSB-first within each byte.
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Number of locked slots.
    pub fn locked_count(&self) -> usize {
        self.locked.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Dump as a 4-byte big-endian bit count followed by the packed bitmap.
    pub fn to_raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.bitmap.len());
        out.extend_from_slice(&(self.bits as u32).to_be_bytes());
        out.extend_from_slice(&self.bitmap);
        out
    }

    /// Parse a [`to_raw`](Self::to_raw) dump. Detectability and data are neutral.
    ///
    /// Returns `None` if the buffer is shorter than its bit count requires.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        let count: [u8; 4] = raw.get(..4)?.try_into().ok()?;
        let bits = u32::from_be_bytes(count) as usize;
        let packed = raw.get(4..4 + bits.div_ceil(8))?;
        let mut surface = Self::new(bits);
        surface.bitmap.copy_from_slice(packed);
        Some(surface)
    }
}

/// Zero/one balance and run-length distribution of a bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitHistogram {
    pub bits: usize,
    pub ones: usize,
    pub zeros: usize,
    /// `runs[n]` = number of maximal runs of length `n` (runs of
    /// `MAX_RUN_LEN - 1` or more are counted in the last bucket).
    pub runs: [usize; MAX_RUN_LEN],
}

/// Count ones, zeros and run lengths of the current bits.
pub fn histogram(surface: &BitSurface) -> BitHistogram {
    let mut hist = BitHistogram {
        bits: surface.bits(),
        ones: 0,
        zeros: 0,
        runs: [0; MAX_RUN_LEN],
    };
    if surface.is_empty() {
        return hist;
    }

    let mut current = surface.bit(0);
    let mut run = 0usize;
    for pos in 0..surface.bits() {
        let bit = surface.bit(pos);
        if bit {
            hist.ones += 1;
        } else {
            hist.zeros += 1;
        }
        if bit == current {
            run += 1;
        } else {
            hist.runs[run.min(MAX_RUN_LEN - 1)] += 1;
            current = bit;
            run = 1;
        }
    }
    hist.runs[run.min(MAX_RUN_LEN - 1)] += 1;
    hist
}
