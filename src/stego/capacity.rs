// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Hidden-channel capacity planning.
//!
//! One modulated symbol carries one bit, so the channel moves
//! `sample_rate / samples_per_symbol` bits per second. Over a clip of
//! `sample_count / sample_rate` seconds that gives the capacity in bits, and
//! the redundancy is how many whole frames fit into it.

use crate::stego::frame::FRAME_OVERHEAD;

/// Number of times a frame of `frame_byte_len` bytes fits into the carrier.
///
/// Returns 0 when the frame does not fit even once; callers must treat that
/// as "payload too large for this carrier".
pub fn plan(
    sample_rate: u32,
    sample_count: usize,
    samples_per_symbol: usize,
    frame_byte_len: usize,
) -> usize {
    let frame_bits = frame_byte_len * 8;
    if frame_bits == 0 {
        return 0;
    }
    capacity_bits(sample_rate, sample_count, samples_per_symbol) / frame_bits
}

/// Channel capacity in bits: bit rate × duration.
pub fn capacity_bits(sample_rate: u32, sample_count: usize, samples_per_symbol: usize) -> usize {
    if sample_rate == 0 || samples_per_symbol == 0 {
        return 0;
    }
    let bit_rate = sample_rate as f64 / samples_per_symbol as f64;
    let duration = sample_count as f64 / sample_rate as f64;
    // Guard against 44099.999... style rounding on exact multiples.
    (bit_rate * duration + 1e-9).floor() as usize
}

/// Summary of a capacity plan, for reporting and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    /// Bits the carrier can hold.
    pub capacity_bits: usize,
    /// Bits of one frame.
    pub frame_bits: usize,
    /// Whole frames that fit.
    pub redundancy: usize,
    /// Largest body that still fits once, in bytes.
    pub max_body_len: usize,
}

impl CapacityReport {
    pub fn new(
        sample_rate: u32,
        sample_count: usize,
        samples_per_symbol: usize,
        body_len: usize,
    ) -> Self {
        let capacity_bits = capacity_bits(sample_rate, sample_count, samples_per_symbol);
        let frame_bytes = body_len + FRAME_OVERHEAD;
        Self {
            capacity_bits,
            frame_bits: frame_bytes * 8,
            redundancy: plan(sample_rate, sample_count, samples_per_symbol, frame_bytes),
            max_body_len: (capacity_bits / 8).saturating_sub(FRAME_OVERHEAD),
        }
    }
}
