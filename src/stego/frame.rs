// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Header and payload framing.
//!
//! Every embedding writes two pieces, each XORed with the Encryption
//! keystream:
//!
//! ```text
//! header  [2 bytes] seed        (little-endian u16)
//!         [2 bytes] length      (little-endian u16, plaintext bytes)
//! payload [N bytes] message
//! ```
//!
//! With error correction both pieces are Golay-packed before encryption:
//! the bytes are padded to a multiple of three, every 3-byte group is split
//! into two 12-bit words (low half first) and each becomes a 23-bit
//! codeword, packed LSB-first.
//!
//! The padding describes itself. With `adj = len % 3` the tail is extended
//! with `0, 1, .., 2 - adj`, so the final byte tells the decoder how many
//! padding bytes to strip (one to three).

use super::error::StegoError;
use super::golay::{self, CODEBITS, CODEMASK, DATABITS, DATAMASK};
use super::keystream::Keystream;

/// Plaintext header size: seed and length.
pub const HEADER_LEN: usize = 4;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Decoded embedding header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub seed: u16,
    /// Payload length in bytes before error correction.
    pub len: u16,
}

impl Header {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let [s0, s1] = self.seed.to_le_bytes();
        let [l0, l1] = self.len.to_le_bytes();
        [s0, s1, l0, l1]
    }

    /// Parse a decoded (decrypted, Golay-corrected) header.
    pub fn parse(bytes: &[u8]) -> Result<Self, StegoError> {
        if bytes.len() != HEADER_LEN {
            return Err(StegoError::HeaderCorrupt { len: bytes.len() });
        }
        Ok(Self {
            seed: u16::from_le_bytes([bytes[0], bytes[1]]),
            len: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// Size in bytes of `len` plaintext bytes once framed.
pub fn encoded_len(len: usize, error_correction: bool) -> usize {
    if !error_correction {
        return len;
    }
    let groups = len / 3 + 1;
    (groups * 2 * CODEBITS as usize + 7) / 8
}

/// Frame `data`: Golay-pack if requested, then encrypt with `stream`.
pub fn encode(data: &[u8], stream: &mut Keystream, error_correction: bool) -> Vec<u8> {
    let mut out = if error_correction { golay_pack(data) } else { data.to_vec() };
    stream.apply(&mut out);
    out
}

/// Reverse of [`encode`]: decrypt with `stream`, then Golay-unpack if requested.
///
/// # Errors
/// [`StegoError::PaddingCorrupt`] if the Golay padding does not check out.
pub fn decode(
    data: &[u8],
    stream: &mut Keystream,
    error_correction: bool,
) -> Result<Vec<u8>, StegoError> {
    let mut plain = data.to_vec();
    stream.apply(&mut plain);
    if error_correction {
        golay_unpack(&plain)
    } else {
        Ok(plain)
    }
}

fn golay_pack(data: &[u8]) -> Vec<u8> {
    let adj = data.len() % 3;
    let mut padded = Vec::with_capacity(data.len() + 3 - adj);
    padded.extend_from_slice(data);
    padded.extend(0..(3 - adj) as u8);

    let mut out = Vec::with_capacity(encoded_len(data.len(), true));
    let mut acc: u64 = 0;
    let mut acc_bits = 0u32;
    for group in padded.chunks_exact(3) {
        let mut word = u32::from_le_bytes([group[0], group[1], group[2], 0]);
        for _ in 0..2 {
            acc |= (golay::encode(word & DATAMASK) as u64) << acc_bits;
            acc_bits += CODEBITS;
            while acc_bits >= 8 {
                out.push(acc as u8);
                acc >>= 8;
                acc_bits -= 8;
            }
            word >>= DATABITS;
        }
    }
    if acc_bits > 0 {
        out.push(acc as u8);
    }
    out
}

fn golay_unpack(data: &[u8]) -> Result<Vec<u8>, StegoError> {
    let mut codewords = data.len() * 8 / CODEBITS as usize;
    codewords -= codewords % 2;

    let mut out = Vec::with_capacity(codewords * 3 / 2);
    let mut input = data.iter();
    let mut acc: u64 = 0;
    let mut acc_bits = 0u32;
    let mut word: u32 = 0;
    let mut word_bits = 0u32;
    for _ in 0..codewords {
        while acc_bits < CODEBITS {
            let Some(&byte) = input.next() else { break };
            acc |= (byte as u64) << acc_bits;
            acc_bits += 8;
        }
        word |= golay::decode(acc as u32 & CODEMASK) << word_bits;
        acc >>= CODEBITS;
        acc_bits = acc_bits.saturating_sub(CODEBITS);
        word_bits += DATABITS;
        while word_bits >= 8 {
            out.push(word as u8);
            word >>= 8;
            word_bits -= 8;
        }
    }

    strip_padding(out)
}

fn strip_padding(mut out: Vec<u8>) -> Result<Vec<u8>, StegoError> {
    let marker = out.last().copied().unwrap_or(u8::MAX);
    let pad = marker as usize;
    if marker > 2 || out.len() < pad + 1 {
        tracing::warn!(marker, "golay padding is incorrect");
        return Err(StegoError::PaddingCorrupt { marker });
    }
    let tail = &out[out.len() - 1 - pad..];
    if tail.iter().enumerate().any(|(j, &b)| b as usize != j) {
        tracing::warn!(marker, "golay padding is incorrect");
        return Err(StegoError::PaddingCorrupt { marker });
    }
    out.truncate(out.len() - 1 - pad);
    Ok(out)
}
