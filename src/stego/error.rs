// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the embedding engine.
//!
//! [`StegoError`] covers every failure a caller can observe, from placing the
//! header through decoding the Golay-packed payload. Trial embeddings inside
//! the seed search never surface these directly; they carry a
//! [`FailureKind`](crate::stego::embed::FailureKind) instead and only the
//! committing embed converts it.

use core::fmt;

/// Errors that can occur while embedding into or extracting from a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// The fixed seed/length preamble could not be placed (retryable with
    /// another seed).
    HeaderPlacementFailed,
    /// The payload could not be placed after the preamble (retryable with
    /// another seed).
    BodyPlacementFailed,
    /// The carrier cannot hold the message under any seed.
    CapacityExceeded { needed_bits: usize, available_bits: usize },
    /// The message is larger than the carrier's statistics allow to correct.
    CorrectableSizeExceeded { bits: usize, max: usize },
    /// The payload does not fit the 16-bit length field.
    MessageTooLarge { len: usize },
    /// The self-describing padding of a Golay-decoded stream is inconsistent.
    PaddingCorrupt { marker: u8 },
    /// The decoded preamble did not have the expected four bytes.
    HeaderCorrupt { len: usize },
    /// The decoded payload length disagrees with the preamble.
    LengthMismatch { expected: usize, actual: usize },
    /// The preamble announces more data than the carrier has bytes.
    PayloadTooLong { len: usize, max: usize },
    /// Extraction walked past the last bit of the carrier.
    CarrierExhausted,
    /// The operation was cancelled through [`progress::cancel`](crate::stego::progress::cancel).
    Cancelled,
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderPlacementFailed => write!(f, "could not place the embedding header"),
            Self::BodyPlacementFailed => write!(f, "could not place the payload body"),
            Self::CapacityExceeded { needed_bits, available_bits } => write!(
                f,
                "not enough bits in carrier: need {needed_bits}, have {available_bits}"
            ),
            Self::CorrectableSizeExceeded { bits, max } => write!(
                f,
                "message larger than correctable size: {bits} > {max} bits"
            ),
            Self::MessageTooLarge { len } => write!(f, "payload of {len} bytes exceeds 65535"),
            Self::PaddingCorrupt { marker } => write!(f, "padding is incorrect: {marker}"),
            Self::HeaderCorrupt { len } => write!(f, "decoded header has wrong length: {len}"),
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "decoded payload length {actual} does not match header length {expected}"
            ),
            Self::PayloadTooLong { len, max } => {
                write!(f, "extracted length is too long: {len} > {max}")
            }
            Self::CarrierExhausted => write!(f, "ran out of carrier bits"),
            Self::Cancelled => write!(f, "operation cancelled by user"),
        }
    }
}

impl std::error::Error for StegoError {}
