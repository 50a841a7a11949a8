// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Binary (23,12,7) Golay code.
//!
//! Systematic encoding: the 12 information bits occupy the top of the 23-bit
//! codeword, the 11 low bits are the remainder of `info * x^11` modulo the
//! generator polynomial `g(x) = x^11 + x^10 + x^6 + x^5 + x^4 + x^2 + 1`.
//!
//! The code is perfect: the 2048 syndromes are in one-to-one correspondence
//! with the error patterns of weight 0..=3
//!
//! | Weight | Patterns |
//! |--------|----------|
//! | 0      | 1        |
//! | 1      | 23       |
//! | 2      | 253      |
//! | 3      | 1771     |
//! | total  | 2048     |
//!
//! so both encoding and decoding are plain table lookups. Up to three bit
//! errors per codeword are corrected; four or more decode to some other
//! codeword.

use std::sync::OnceLock;

/// Information bits per codeword.
pub const DATABITS: u32 = 12;
/// Bits per codeword.
pub const CODEBITS: u32 = 23;
/// Correction radius.
pub const ERRORBITS: u32 = 3;

/// Mask for a 12-bit information word.
pub const DATAMASK: u32 = 0x000fff;
/// Mask for a 23-bit codeword.
pub const CODEMASK: u32 = 0x7fffff;

/// Generator polynomial g(x), bit i = coefficient of x^i.
const GENPOL: u32 = 0x0000_0c75;
/// x^22, the highest degree a codeword can have.
const X22: u32 = 0x0040_0000;
/// x^11, the degree of g(x).
const X11: u32 = 0x0000_0800;
/// Any bit at x^11 or above means the pattern is not yet reduced.
const MASK12: u32 = 0xffff_f800;

/// Precomputed encode/decode tables.
pub struct GolayTables {
    /// 12-bit information word -> 23-bit codeword.
    pub encoding: [u32; 4096],
    /// 11-bit syndrome -> most likely error pattern (weight <= 3).
    pub decoding: [u32; 2048],
}

/// Remainder of `pattern` modulo g(x), by shift-and-XOR long division.
///
/// Used on information words (encoding), error patterns (table build) and
/// received words (decoding).
pub fn syndrome(mut pattern: u32) -> u32 {
    let mut aux = X22;
    if pattern >= X11 {
        while pattern & MASK12 != 0 {
            while aux & pattern == 0 {
                aux >>= 1;
            }
            pattern ^= (aux / X11) * GENPOL;
        }
    }
    pattern
}

/// Lexicographic r-subsets of `0..n`, as bit positions.
struct Combinations {
    n: usize,
    idx: Vec<usize>,
    first: bool,
}

impl Combinations {
    fn new(n: usize, r: usize) -> Self {
        Self { n, idx: (0..r).collect(), first: true }
    }
}

impl Iterator for Combinations {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let r = self.idx.len();
        if self.first {
            self.first = false;
        } else {
            // Rightmost index that can still move right.
            let mut k = r;
            loop {
                if k == 0 {
                    return None;
                }
                k -= 1;
                if self.idx[k] < self.n - r + k {
                    break;
                }
            }
            self.idx[k] += 1;
            for m in k + 1..r {
                self.idx[m] = self.idx[m - 1] + 1;
            }
        }
        Some(self.idx.iter().fold(0u32, |acc, &bit| acc | (1 << bit)))
    }
}

fn build_tables() -> GolayTables {
    let mut encoding = [0u32; 4096];
    for (info, slot) in encoding.iter_mut().enumerate() {
        let shifted = (info as u32) << 11;
        *slot = shifted + syndrome(shifted);
    }

    let mut decoding = [0u32; 2048];
    for weight in 0..=ERRORBITS as usize {
        for pattern in Combinations::new(CODEBITS as usize, weight) {
            decoding[syndrome(pattern) as usize] = pattern;
        }
    }

    GolayTables { encoding, decoding }
}

/// Shared tables, built on first use.
pub fn tables() -> &'static GolayTables {
    static TABLES: OnceLock<GolayTables> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

/// Encode the low 12 bits of `data` into a 23-bit codeword.
pub fn encode(data: u32) -> u32 {
    tables().encoding[(data & DATAMASK) as usize]
}

/// Correct up to three bit errors in `received` and return the 12 data bits.
pub fn decode(received: u32) -> u32 {
    let received = received & CODEMASK;
    let corrected = received ^ tables().decoding[syndrome(received) as usize];
    (corrected >> (CODEBITS - DATABITS)) & DATAMASK
}
