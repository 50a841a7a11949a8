// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Capacity limits.
//!
//! Two limits apply to a message:
//! - The carrier must offer at least [`MIN_CAPACITY_RATIO`] usable bits per
//!   framed payload bit, otherwise no seed can spread the payload.
//! - A carrier with a statistics-preserving foil pass can only compensate
//!   so many changes; the message's correctable length must stay below
//!   what the preserver reports.

use crate::stego::error::StegoError;
use crate::stego::frame::{self, HEADER_LEN, MAX_PAYLOAD_LEN};

/// Minimum ratio of carrier bits to framed payload bits.
pub const MIN_CAPACITY_RATIO: usize = 2;

/// Smallest carrier (in bits) that can take `encoded_len` framed bytes.
pub fn min_carrier_bits(encoded_len: usize) -> usize {
    MIN_CAPACITY_RATIO * encoded_len * 8
}

/// Bits of a framed payload that the foil pass must be able to correct.
///
/// With error correction only about half the codeword bits carry data, so
/// only those count.
pub fn correctable_bits(encoded_len: usize, error_correction: bool) -> usize {
    if error_correction {
        encoded_len / 2 * 8
    } else {
        encoded_len * 8
    }
}

/// Reject a message the carrier's preserver can't compensate.
///
/// `max` is the limit from [`Preserve::init`](crate::stego::carrier::Preserve::init);
/// `None` means the carrier has no such limit.
///
/// # Errors
/// [`StegoError::CorrectableSizeExceeded`] if the limit is exceeded.
pub fn check_correctable(
    encoded_len: usize,
    error_correction: bool,
    max: Option<usize>,
) -> Result<(), StegoError> {
    let bits = correctable_bits(encoded_len, error_correction);
    match max {
        Some(max) if bits > max => Err(StegoError::CorrectableSizeExceeded { bits, max }),
        _ => Ok(()),
    }
}

/// Estimate the largest message (in bytes) a carrier of `bits` can hold.
///
/// Counts the ratio limit and the header. The estimate is an upper bound:
/// a given key may still fail to place the last bytes.
pub fn estimate_capacity(bits: usize, error_correction: bool) -> usize {
    let fits = |n: usize| {
        let encoded = frame::encoded_len(n, error_correction);
        let header = frame::encoded_len(HEADER_LEN, error_correction);
        min_carrier_bits(encoded) <= bits && (encoded + header) * 8 <= bits
    };
    if !fits(0) {
        return 0;
    }

    // encoded_len is monotonic, so bisect.
    let (mut lo, mut hi) = (0usize, MAX_PAYLOAD_LEN);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_threshold() {
        assert_eq!(min_carrier_bits(2), 32);
        assert_eq!(min_carrier_bits(0), 0);
    }

    #[test]
    fn correctable_halves_with_ecc() {
        assert_eq!(correctable_bits(10, false), 80);
        assert_eq!(correctable_bits(12, true), 48);
        assert_eq!(correctable_bits(13, true), 48);
    }

    #[test]
    fn correctable_limit() {
        assert!(check_correctable(100, false, None).is_ok());
        assert!(check_correctable(100, false, Some(800)).is_ok());
        assert_eq!(
            check_correctable(100, false, Some(799)),
            Err(StegoError::CorrectableSizeExceeded { bits: 800, max: 799 })
        );
    }

    #[test]
    fn capacity_without_ecc() {
        assert_eq!(estimate_capacity(256, false), 16);
        assert_eq!(estimate_capacity(16, false), 0);
        assert_eq!(estimate_capacity(48, false), 2);
    }

    #[test]
    fn capacity_with_ecc() {
        let cap = estimate_capacity(20_000, true);
        assert!(frame::encoded_len(cap, true) * 16 <= 20_000);
        assert!(frame::encoded_len(cap + 1, true) * 16 > 20_000);
        assert_eq!(estimate_capacity(40, true), 0);
    }

    #[test]
    fn capacity_is_capped_by_length_field() {
        assert_eq!(estimate_capacity(usize::MAX / 64, false), MAX_PAYLOAD_LEN);
    }
}
