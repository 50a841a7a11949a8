// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Bit placement engine.
//!
//! One call to [`place`] writes (or, in a trial, pretends to write) the
//! header and the payload of an [`EmbedJob`] for a given seed:
//!
//! 1. The header `[seed, length]` is encrypted from the start of the
//!    Encryption stream, Golay-packed if requested, and placed with a skip
//!    modulus fitted to the carrier.
//! 2. The seed is mixed into the position stream.
//! 3. Each payload byte is placed after retuning the skip modulus with
//!    [`BitIterator::adapt`].
//!
//! Bits go LSB-first. A slot that already holds the wanted value is still
//! locked. A mismatch costs one change plus the slot's detectability. A
//! mismatch on a locked slot can't be rewritten: without error correction
//! that aborts the placement; with it, the bit is left wrong and counted
//! against the three errors each 23-bit codeword can absorb.
//!
//! With error correction every 23-bit window ends in a
//! [bias-correction pass](super::bias) that reverts flips the codeword can
//! absorb anyway.
//!
//! Trials run against `&BitSurface` and never write, so any number of them
//! can share one surface.

use super::bias;
use super::bitmap::BitSurface;
use super::capacity;
use super::error::StegoError;
use super::frame::{self, Header, HEADER_LEN};
use super::golay::{CODEBITS, ERRORBITS};
use super::iterator::BitIterator;
use super::keystream::{Keystream, ENCRYPTION};

/// Leading header bits that hold the seed. A locked collision within them
/// may clear with another seed; one past them can't.
const SEEDED_HEADER_BITS: usize = 16;

/// Why a placement failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The header collided with locked bits; another seed may work.
    Header,
    /// The payload collided or ran out of carrier; another seed may work.
    Body,
    /// No seed can work on this carrier.
    Permanent,
}

impl FailureKind {
    /// Convert into the caller-facing error for `job` on a carrier of `available_bits`.
    pub fn into_error(self, job: &EmbedJob, available_bits: usize) -> StegoError {
        match self {
            Self::Header => StegoError::HeaderPlacementFailed,
            Self::Body => StegoError::BodyPlacementFailed,
            Self::Permanent => StegoError::CapacityExceeded {
                needed_bits: job.needed_bits(),
                available_bits,
            },
        }
    }
}

/// Result of a successful placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Bits whose value had to change.
    pub changed: usize,
    /// Sum of the detectability classes of the changed bits.
    pub bias: i64,
    /// Header and payload bits visited.
    pub bits_embedded: usize,
    /// Iterator position after the last bit.
    pub end_offset: usize,
}

impl Outcome {
    /// Search cost: lower is less conspicuous.
    pub fn cost(&self) -> i64 {
        self.changed as i64 + self.bias
    }
}

/// The surface a placement runs against.
pub enum Target<'a> {
    /// Account only; the surface is left as is.
    Trial(&'a BitSurface),
    /// Write and lock bits.
    Commit(&'a mut BitSurface),
}

impl Target<'_> {
    /// The surface being placed into, read-only.
    pub fn surface(&self) -> &BitSurface {
        match self {
            Self::Trial(s) => s,
            Self::Commit(s) => s,
        }
    }

    /// Store `bit` at `pos` and lock it.
    fn write(&mut self, pos: usize, bit: bool) {
        if let Self::Commit(s) = self {
            s.set_locked(pos, true);
            s.set_bit(pos, bit);
        }
    }

    /// Undo a flip at `pos` and release its lock.
    pub(crate) fn revert(&mut self, pos: usize) {
        if let Self::Commit(s) = self {
            s.set_locked(pos, false);
            let bit = s.bit(pos);
            s.set_bit(pos, !bit);
        }
    }
}

/// Everything about an embedding that does not depend on the seed.
///
/// Built once, then shared by every trial of the seed search.
#[derive(Clone)]
pub struct EmbedJob {
    iter: BitIterator,
    stream: Keystream,
    payload: Vec<u8>,
    plain_len: u16,
    error_correction: bool,
}

impl EmbedJob {
    /// Prepare `message` for embedding under `key`.
    ///
    /// The payload is framed with the Encryption stream positioned right
    /// after the header bytes, so header and payload never share keystream.
    ///
    /// # Errors
    /// [`StegoError::MessageTooLarge`] if `message` exceeds 65535 bytes.
    pub fn new(key: &[u8], message: &[u8], error_correction: bool) -> Result<Self, StegoError> {
        let plain_len = u16::try_from(message.len())
            .map_err(|_| StegoError::MessageTooLarge { len: message.len() })?;
        let stream = Keystream::new(ENCRYPTION, key);
        let mut payload_stream = stream.clone();
        payload_stream.skip(frame::encoded_len(HEADER_LEN, error_correction));
        let payload = frame::encode(message, &mut payload_stream, error_correction);
        Ok(Self {
            iter: BitIterator::new(key),
            stream,
            payload,
            plain_len,
            error_correction,
        })
    }

    /// Framed payload length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.payload.len()
    }

    pub fn plain_len(&self) -> usize {
        self.plain_len as usize
    }

    pub fn error_correction(&self) -> bool {
        self.error_correction
    }

    /// Carriers smaller than this can't hold the payload under any seed.
    pub fn min_bits(&self) -> usize {
        capacity::min_carrier_bits(self.payload.len())
    }

    /// Lower bound on the carrier size, header included.
    pub fn needed_bits(&self) -> usize {
        let header = frame::encoded_len(HEADER_LEN, self.error_correction);
        self.min_bits().max((header + self.payload.len()) * 8)
    }
}

enum Stop {
    /// Walked past the last bit.
    Exhausted,
    /// A locked bit could not take the wanted value.
    Locked,
}

struct Session<'a> {
    target: Target<'a>,
    error_correction: bool,
    window_left: u32,
    errors: u32,
    flips: Vec<usize>,
    count: usize,
    changed: usize,
    bias: i64,
}

impl<'a> Session<'a> {
    fn new(target: Target<'a>, error_correction: bool) -> Self {
        Self {
            target,
            error_correction,
            window_left: 0,
            errors: 0,
            flips: Vec::with_capacity(CODEBITS as usize),
            count: 0,
            changed: 0,
            bias: 0,
        }
    }

    fn place_bits(&mut self, iter: &mut BitIterator, mut value: u8, nbits: u32) -> Result<(), Stop> {
        let bits = self.target.surface().bits();
        for _ in 0..nbits {
            let pos = iter.offset();
            if pos >= bits {
                return Err(Stop::Exhausted);
            }
            if self.error_correction {
                if self.window_left == 0 {
                    self.close_window();
                    self.window_left = CODEBITS;
                }
                self.window_left -= 1;
            }
            self.count += 1;

            let want = value & 1 == 1;
            let mut forced = false;
            let surface = self.target.surface();
            if surface.bit(pos) != want {
                self.bias += surface.detect(pos) as i64;
                self.changed += 1;
                if surface.is_locked(pos) {
                    if !self.error_correction {
                        return Err(Stop::Locked);
                    }
                    self.errors += 1;
                    if self.errors > ERRORBITS {
                        return Err(Stop::Locked);
                    }
                    forced = true;
                } else if self.error_correction {
                    self.flips.push(pos);
                }
            }
            if !forced {
                self.target.write(pos, want);
            }

            value >>= 1;
            iter.advance();
        }
        Ok(())
    }

    /// Run the bias pass over the current window and start a fresh one.
    fn close_window(&mut self) {
        if !self.flips.is_empty() {
            let correction = bias::correct_window(&mut self.target, &self.flips, self.errors);
            self.changed -= correction.reverted;
            self.bias -= correction.bias;
        }
        self.flips.clear();
        self.errors = 0;
    }
}

/// Place `job` with `seed` into `target`.
///
/// Trials and commits with the same inputs return the same result.
pub fn place(target: Target<'_>, job: &EmbedJob, seed: u16) -> Result<Outcome, FailureKind> {
    let bits = target.surface().bits();
    if bits < job.min_bits() {
        return Err(FailureKind::Permanent);
    }

    let ecc = job.error_correction;
    let mut iter = job.iter.clone();
    let mut stream = job.stream.clone();
    let header = Header { seed, len: job.plain_len };
    let header = frame::encode(&header.to_bytes(), &mut stream, ecc);
    iter.fit_header(bits, header.len() * 8);

    let mut session = Session::new(target, ecc);
    for &byte in &header {
        match session.place_bits(&mut iter, byte, 8) {
            Ok(()) => {}
            Err(Stop::Exhausted) => return Err(FailureKind::Permanent),
            // `count` includes the colliding bit.
            Err(Stop::Locked) if ecc || session.count <= SEEDED_HEADER_BITS => {
                return Err(FailureKind::Header)
            }
            Err(Stop::Locked) => return Err(FailureKind::Permanent),
        }
    }

    // The payload starts a new codeword window.
    session.window_left = 0;
    iter.reseed(seed);

    let mut remaining = job.payload.len();
    for &byte in &job.payload {
        if iter.offset() >= bits {
            return Err(FailureKind::Body);
        }
        iter.adapt(bits, remaining);
        remaining -= 1;
        session
            .place_bits(&mut iter, byte, 8)
            .map_err(|_| FailureKind::Body)?;
    }

    if ecc {
        session.close_window();
    }

    Ok(Outcome {
        changed: session.changed,
        bias: session.bias,
        bits_embedded: session.count,
        end_offset: iter.offset(),
    })
}
