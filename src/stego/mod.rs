// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Steganographic embedding and extraction.
//!
//! The engine works on a [`BitSurface`]: one slot per usable low-order bit
//! of a carrier, with lock bookkeeping and per-slot detectability.
//!
//! - **Keystreams** ([`keystream`]): RC4 streams keyed by HMAC-SHA256 with
//!   domain labels, one for bit positions and one for encryption.
//! - **Positions** ([`iterator`]): a keyed forward walk whose step width
//!   adapts to the remaining carrier.
//! - **Framing** ([`frame`], [`golay`]): `[seed, length]` header plus
//!   payload, optionally Golay (23,12) protected, XORed with the keystream.
//! - **Placement** ([`embed`], [`bias`]): writes and locks bits, tallies
//!   changes and detectability, reverts flips a codeword can absorb.
//! - **Seed search** ([`search`]): trial placements over a range of seeds,
//!   optionally on the rayon pool (`parallel` feature).
//! - **Carriers** ([`carrier`], [`foil`]): adapters for 8-bit samples and
//!   quantized coefficients, and the histogram-preserving foil pass.

pub mod bias;
pub mod bitmap;
pub mod capacity;
pub mod carrier;
pub mod embed;
pub mod error;
pub mod extract;
pub mod foil;
pub mod frame;
pub mod golay;
pub mod iterator;
pub mod keystream;
mod pipeline;
pub mod progress;
pub mod search;

pub use bitmap::{histogram, BitHistogram, BitSurface};
pub use capacity::estimate_capacity;
pub use carrier::{Carrier, CoefficientCarrier, CoefficientPreserver, NoPreserve, Preserve, SampleCarrier};
pub use error::StegoError;
pub use foil::{FoilReport, MAX_SEEK};
pub use pipeline::{
    embed, embed_with_derivations, extract, hide, reveal, Dataset, EmbedConfig, EmbedReport,
    HideOptions, HideReport,
};
pub use search::{SearchStats, SeedRange, DEFAULT_SEED_LIMIT};
