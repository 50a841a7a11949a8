// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! RC4-family keystream used for position selection and payload encryption.
//!
//! Each session derives two independent streams from the same user key by
//! domain separation:
//!
//! - **Seeding**: drives the [`BitIterator`](crate::stego::iterator::BitIterator)
//!   that picks carrier positions.
//! - **Encryption**: XORed over the Golay-packed header and payload.
//!
//! The key material for a stream is `HMAC-SHA256(label, key)`. The 32-byte
//! digest is folded into a fresh identity permutation with [`Keystream::mix_in`],
//! the same operation later used to reseed the position stream with the
//! 16-bit embedding seed.
//!
//! The state is small and flat, so speculative trials simply `clone()` it.
//! Embedder and extractor must issue the exact same call sequence to stay in
//! lockstep.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Domain label for the bit-position stream.
pub const SEEDING: &[u8] = b"Seeding";

/// Domain label for the payload encryption stream.
pub const ENCRYPTION: &[u8] = b"Encryption";

/// RC4 permutation state plus its two indices.
#[derive(Clone)]
pub struct Keystream {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Keystream {
    /// Derive a keystream for `label` from `key`.
    pub fn new(label: &[u8], key: &[u8]) -> Self {
        let mut stream = Self::identity();
        let digest = derive_key_material(label, key);
        stream.mix_in(&*digest);
        stream
    }

    fn identity() -> Self {
        let mut s = [0u8; 256];
        for (n, slot) in s.iter_mut().enumerate() {
            *slot = n as u8;
        }
        Self { s, i: 0, j: 0 }
    }

    /// Fold `extra` into the permutation without discarding the current state.
    ///
    /// One full pass over the 256 entries, cycling through `extra`; afterwards
    /// both indices point at the last swapped slot. Empty input is a no-op.
    pub fn mix_in(&mut self, extra: &[u8]) {
        if extra.is_empty() {
            return;
        }
        self.i = self.i.wrapping_sub(1);
        for n in 0..256 {
            self.i = self.i.wrapping_add(1);
            let si = self.s[self.i as usize];
            self.j = self.j.wrapping_add(si).wrapping_add(extra[n % extra.len()]);
            self.s[self.i as usize] = self.s[self.j as usize];
            self.s[self.j as usize] = si;
        }
        self.j = self.i;
    }

    /// Next keystream byte.
    pub fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        let si = self.s[self.i as usize];
        self.j = self.j.wrapping_add(si);
        let sj = self.s[self.j as usize];
        self.s[self.i as usize] = sj;
        self.s[self.j as usize] = si;
        self.s[si.wrapping_add(sj) as usize]
    }

    /// Next four keystream bytes combined little-endian.
    pub fn next_word(&mut self) -> u32 {
        let b = [self.next_byte(), self.next_byte(), self.next_byte(), self.next_byte()];
        u32::from_le_bytes(b)
    }

    /// Discard `n` bytes of keystream.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.next_byte();
        }
    }

    /// XOR `data` in place with the next `data.len()` keystream bytes.
    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.next_byte();
        }
    }
}

/// `HMAC-SHA256(label, key)`, kept in a zeroizing buffer.
fn derive_key_material(label: &[u8], key: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(label).expect("HMAC accepts any key length");
    mac.update(key);
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}
