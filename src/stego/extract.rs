// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Payload extraction.
//!
//! Replays the embedder's walk: same key, same header fit, same reseed and
//! the same per-byte [`adapt`](BitIterator::adapt) calls, reading bits
//! LSB-first instead of writing them.

use super::bitmap::BitSurface;
use super::error::StegoError;
use super::frame::{self, Header, HEADER_LEN};
use super::iterator::BitIterator;
use super::keystream::{Keystream, ENCRYPTION};

/// Recover the message embedded under `key`.
///
/// # Errors
/// - [`StegoError::CarrierExhausted`] if the walk leaves the carrier.
/// - [`StegoError::HeaderCorrupt`] / [`StegoError::PaddingCorrupt`] if the
///   header does not decode (usually a wrong key).
/// - [`StegoError::PayloadTooLong`] if the header announces more data than
///   the carrier holds.
/// - [`StegoError::LengthMismatch`] if the decoded payload disagrees with
///   the header.
pub fn extract(
    surface: &BitSurface,
    key: &[u8],
    error_correction: bool,
) -> Result<Vec<u8>, StegoError> {
    let bits = surface.bits();
    let mut iter = BitIterator::new(key);
    let mut stream = Keystream::new(ENCRYPTION, key);

    let header_len = frame::encoded_len(HEADER_LEN, error_correction);
    iter.fit_header(bits, header_len * 8);
    let raw = (0..header_len)
        .map(|_| read_byte(surface, &mut iter))
        .collect::<Result<Vec<u8>, _>>()?;
    let decoded = frame::decode(&raw, &mut stream, error_correction)?;
    let header = Header::parse(&decoded).map_err(|e| {
        tracing::warn!(len = decoded.len(), "decoded header has wrong length");
        e
    })?;

    let expected = header.len as usize;
    let encoded = frame::encoded_len(expected, error_correction);
    if encoded > surface.bytes() {
        tracing::warn!(len = encoded, max = surface.bytes(), "extracted length is too long");
        return Err(StegoError::PayloadTooLong { len: encoded, max: surface.bytes() });
    }

    iter.reseed(header.seed);
    let mut raw = Vec::with_capacity(encoded);
    for n in 0..encoded {
        iter.adapt(bits, encoded - n);
        raw.push(read_byte(surface, &mut iter)?);
    }

    let payload = frame::decode(&raw, &mut stream, error_correction)?;
    if payload.len() != expected {
        tracing::warn!(expected, actual = payload.len(), "payload length mismatch");
        return Err(StegoError::LengthMismatch { expected, actual: payload.len() });
    }
    tracing::debug!(seed = header.seed, len = expected, end = iter.offset(), "extracted");
    Ok(payload)
}

fn read_byte(surface: &BitSurface, iter: &mut BitIterator) -> Result<u8, StegoError> {
    let mut byte = 0u8;
    for bit in 0..8 {
        let pos = iter.offset();
        if pos >= surface.bits() {
            return Err(StegoError::CarrierExhausted);
        }
        byte |= (surface.bit(pos) as u8) << bit;
        iter.advance();
    }
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::embed::{place, EmbedJob, Target};

    fn embed(surface: &mut BitSurface, key: &[u8], msg: &[u8], ecc: bool, seed: u16) {
        let job = EmbedJob::new(key, msg, ecc).unwrap();
        place(Target::Commit(surface), &job, seed).unwrap();
    }

    #[test]
    fn recovers_plain_payload() {
        let mut s = BitSurface::new(256);
        embed(&mut s, b"test", b"AB", false, 0);
        assert_eq!(extract(&s, b"test", false).unwrap(), b"AB");
    }

    #[test]
    fn recovers_ecc_payload() {
        let mut s = BitSurface::new(20_000);
        embed(&mut s, b"key", &[0xff; 30], true, 0);
        assert_eq!(extract(&s, b"key", true).unwrap(), vec![0xff; 30]);
    }

    #[test]
    fn empty_payload() {
        for ecc in [false, true] {
            let mut s = BitSurface::new(4096);
            embed(&mut s, b"k", b"", ecc, 0);
            assert_eq!(extract(&s, b"k", ecc).unwrap(), b"");
        }
    }

    #[test]
    fn tiny_carrier_is_exhausted() {
        let s = BitSurface::new(8);
        assert_eq!(extract(&s, b"k", false), Err(StegoError::CarrierExhausted));
    }

    #[test]
    fn wrong_key_does_not_return_message() {
        let mut s = BitSurface::new(256);
        embed(&mut s, b"test", b"AB", false, 0);
        assert_ne!(extract(&s, b"other", false).ok(), Some(b"AB".to_vec()));
    }

    #[test]
    fn header_length_is_checked_against_carrier() {
        // An all-ones carrier decrypts to a header announcing 25127 bytes.
        let mut s = BitSurface::new(256);
        for pos in 0..256 {
            s.set_bit(pos, true);
        }
        assert_eq!(
            extract(&s, b"k", false),
            Err(StegoError::PayloadTooLong { len: 25127, max: 32 })
        );
    }
}
