// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Several datasets sharing one carrier.

use tacit_core::stego::frame::{self, Header};
use tacit_core::stego::golay::{CODEBITS, ERRORBITS};
use tacit_core::stego::iterator::BitIterator;
use tacit_core::stego::keystream::{Keystream, ENCRYPTION};
use tacit_core::{
    embed, embed_with_derivations, extract, hide, reveal, BitSurface, Carrier, Dataset,
    EmbedConfig, HideOptions, SampleCarrier, StegoError,
};

fn cover() -> SampleCarrier {
    let mut stream = Keystream::new(b"cover", b"multi");
    SampleCarrier::new((0..40_000).map(|_| stream.next_byte()).collect())
}

fn first() -> Vec<u8> {
    (0..200u32).map(|i| (i * 7) as u8).collect()
}

fn second() -> Vec<u8> {
    (0..40u32).map(|i| (i * 13 + 5) as u8).collect()
}

fn ecc() -> EmbedConfig {
    EmbedConfig { error_correction: true, ..EmbedConfig::default() }
}

/// Read one byte's slots along `iter`; `true` where the carrier disagrees
/// with `byte`.
fn mismatches(surface: &BitSurface, iter: &mut BitIterator, byte: u8) -> Vec<bool> {
    (0..8)
        .map(|bit| {
            let pos = iter.offset();
            iter.advance();
            surface.bit(pos) != ((byte >> bit) & 1 == 1)
        })
        .collect()
}

/// Wrong slots in each codeword window of an error-corrected embedding.
fn window_errors(surface: &BitSurface, key: &[u8], message: &[u8], seed: u16) -> Vec<usize> {
    let bits = surface.bits();
    let mut stream = Keystream::new(ENCRYPTION, key);
    let header = Header { seed, len: message.len() as u16 };
    let header = frame::encode(&header.to_bytes(), &mut stream, true);
    let payload = frame::encode(message, &mut stream, true);

    let mut iter = BitIterator::new(key);
    iter.fit_header(bits, header.len() * 8);
    let head: Vec<bool> = header
        .iter()
        .flat_map(|&byte| mismatches(surface, &mut iter, byte))
        .collect();

    iter.reseed(seed);
    let mut body = Vec::with_capacity(payload.len() * 8);
    for (n, &byte) in payload.iter().enumerate() {
        iter.adapt(bits, payload.len() - n);
        body.extend(mismatches(surface, &mut iter, byte));
    }

    let window = CODEBITS as usize;
    head.chunks(window)
        .chain(body.chunks(window))
        .map(|w| w.iter().filter(|&&wrong| wrong).count())
        .collect()
}

#[test]
fn two_ecc_datasets() {
    let mut carrier = cover();
    let (a, b) = (first(), second());
    let datasets = [
        Dataset { key: b"first", message: &a, error_correction: true },
        Dataset { key: b"second", message: &b, error_correction: true },
    ];
    let report = hide(&mut carrier, &datasets, &HideOptions::default()).unwrap();

    let seeds: Vec<u16> = report.datasets.iter().map(|d| d.seed).collect();
    assert_eq!(seeds, [42, 239]);
    assert_eq!((report.datasets[0].changed, report.datasets[0].bias), (1071, -105));
    assert_eq!((report.datasets[1].changed, report.datasets[1].bias), (254, -20));
    assert_eq!(report.changed(), 1325);

    assert_eq!(reveal(&carrier, b"first", true).unwrap(), a);
    assert_eq!(reveal(&carrier, b"second", true).unwrap(), b);
}

#[test]
fn codeword_windows_stay_correctable() {
    let mut surface = cover().bit_surface();
    let report = embed(&mut surface, b"first", &first(), &ecc()).unwrap();
    let after_first = window_errors(&surface, b"first", &first(), report.seed);

    embed(&mut surface, b"second", &second(), &ecc()).unwrap();
    let after_second = window_errors(&surface, b"first", &first(), report.seed);

    let limit = ERRORBITS as usize;
    assert!(after_first.iter().all(|&e| e <= limit), "{after_first:?}");
    assert!(after_second.iter().all(|&e| e <= limit), "{after_second:?}");
    // The bias pass leaves bits wrong; a later dataset can only rewrite those.
    assert!(after_first.iter().sum::<usize>() > 0);
    assert!(after_second.iter().zip(&after_first).all(|(b, a)| b <= a));
    assert_eq!(extract(&surface, b"first", true).unwrap(), first());
}

#[test]
fn later_plain_dataset_collides() {
    let mut surface = cover().bit_surface();
    embed(&mut surface, b"first", &first(), &ecc()).unwrap();
    let before = surface.clone();

    let result = embed(&mut surface, b"second", &second(), &EmbedConfig::default());
    assert_eq!(result, Err(StegoError::BodyPlacementFailed));
    assert_eq!(surface, before);
    assert_eq!(extract(&surface, b"first", true).unwrap(), first());
}

#[test]
fn derived_key_avoids_collision() {
    let mut surface = cover().bit_surface();
    embed(&mut surface, b"first", &first(), &ecc()).unwrap();
    let msg = second();
    let msg = &msg[..24];

    let mut attempt = surface.clone();
    let result = embed(&mut attempt, b"second3", msg, &EmbedConfig::default());
    assert_eq!(result, Err(StegoError::BodyPlacementFailed));

    let report =
        embed_with_derivations(&mut surface, b"second3", msg, &EmbedConfig::default(), 1).unwrap();
    assert_eq!(report.key, b"second31");
    assert_eq!((report.seed, report.changed, report.bias), (47, 118, 9));
    assert_eq!(extract(&surface, b"second31", false).unwrap(), msg);
    assert_eq!(extract(&surface, b"first", true).unwrap(), first());
}

#[test]
fn derivations_run_out() {
    let mut surface = cover().bit_surface();
    embed(&mut surface, b"first", &first(), &ecc()).unwrap();
    let msg = second();
    let msg = &msg[..24];

    // "second2" and "second21" both collide; "second22" would fit.
    let result = embed_with_derivations(&mut surface, b"second2", msg, &EmbedConfig::default(), 1);
    assert_eq!(result, Err(StegoError::BodyPlacementFailed));
}

#[test]
fn hide_retries_every_dataset() {
    let mut carrier = cover();
    let (a, b) = (first(), second());
    let datasets = [
        Dataset { key: b"first", message: &a, error_correction: true },
        Dataset { key: b"second3", message: &b[..24], error_correction: false },
    ];
    let options = HideOptions { derivations: 1, ..HideOptions::default() };
    let report = hide(&mut carrier, &datasets, &options).unwrap();

    assert_eq!(report.datasets[0].key, b"first");
    assert_eq!(report.datasets[1].key, b"second31");
    assert_eq!(reveal(&carrier, b"second31", false).unwrap(), &b[..24]);
    assert_eq!(reveal(&carrier, b"first", true).unwrap(), a);
}

#[test]
fn failed_dataset_leaves_carrier_untouched() {
    let original = cover();
    let mut carrier = original.clone();
    let (a, b) = (first(), second());
    let datasets = [
        Dataset { key: b"first", message: &a, error_correction: true },
        Dataset { key: b"second", message: &b, error_correction: false },
    ];
    let result = hide(&mut carrier, &datasets, &HideOptions::default());
    assert_eq!(result, Err(StegoError::BodyPlacementFailed));
    assert_eq!(carrier, original);
}
