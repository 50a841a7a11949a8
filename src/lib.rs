// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # tacit-core
//!
//! Statistics-aware LSB steganography engine. Hides keyed, encrypted
//! payloads in the low-order bits of a carrier while keeping the number of
//! changed bits, and how conspicuous they are, as low as possible:
//!
//! - A keyed pseudo-random walk picks the carrier bits; a 16-bit seed mixed
//!   into the walk is chosen by trying many and keeping the cheapest.
//! - Optional Golay (23,12) error correction lets later datasets share a
//!   carrier with earlier ones and absorbs up to three wrong bits per
//!   codeword, which a bias-correction pass uses to undo changes.
//! - Carrier adapters keep coefficient histograms intact with a foil pass.
//!
//! Media parsing is out of scope: carriers are in-memory samples or
//! coefficients.
//!
//! # Quick start
//!
//! ```rust
//! use tacit_core::{embed, extract, BitSurface, EmbedConfig};
//!
//! let mut surface = BitSurface::new(4096);
//! let config = EmbedConfig { error_correction: true, ..EmbedConfig::default() };
//! embed(&mut surface, b"key", b"hello", &config).unwrap();
//! assert_eq!(extract(&surface, b"key", true).unwrap(), b"hello");
//! ```

pub mod stego;

pub use stego::{
    embed, embed_with_derivations, estimate_capacity, extract, hide, histogram, reveal,
    BitHistogram, BitSurface, Carrier, CoefficientCarrier, CoefficientPreserver, Dataset,
    EmbedConfig, EmbedReport, FoilReport, HideOptions, HideReport, NoPreserve, Preserve,
    SampleCarrier, SearchStats, SeedRange, StegoError, DEFAULT_SEED_LIMIT, MAX_SEEK,
};
pub use stego::progress;
