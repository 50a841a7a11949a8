// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! 8-bit sample carrier (raw pixel data).
//!
//! Every sample carries one bit in its LSB. Changes near the ends of the
//! range stand out (saturated highlights, deep shadows), so those samples
//! get a non-zero detectability class.

use super::{Carrier, NoPreserve};
use crate::stego::bitmap::BitSurface;

/// Samples at or above this are conspicuous when changed.
const THRES_MAX: u8 = 0xf0;
/// Samples at or below this are cheap to change.
const THRES_MIN: u8 = 0x10;

/// Detectability class of a sample.
fn detect(sample: u8) -> i8 {
    if sample >= THRES_MAX {
        -1
    } else if sample <= THRES_MIN {
        1
    } else {
        0
    }
}

/// Raw interleaved 8-bit samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleCarrier {
    samples: Vec<u8>,
}

impl SampleCarrier {
    pub fn new(samples: Vec<u8>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

impl Carrier for SampleCarrier {
    type Preserver = NoPreserve;

    fn bit_surface(&self) -> BitSurface {
        let mut surface = BitSurface::with_capacity(self.samples.len());
        for &sample in &self.samples {
            surface.push(sample & 1 == 1, detect(sample), sample as i16);
        }
        surface
    }

    fn apply(&mut self, surface: &BitSurface, mark: bool) {
        for (pos, sample) in self.samples.iter_mut().enumerate().take(surface.bits()) {
            if mark && surface.is_locked(pos) {
                *sample = 255;
            }
            *sample = (*sample & !1) | surface.bit(pos) as u8;
        }
    }

    fn preserver(&self) -> NoPreserve {
        NoPreserve
    }
}
