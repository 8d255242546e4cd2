// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload frame construction, tiling and parsing.
//!
//! The frame is the unit that gets repeated across the hidden channel:
//!
//! ```text
//! [4 bytes ] sync pattern DE AD BE EF
//! [N bytes ] body (the encrypted payload)
//! [16 bytes] MD5 digest of the body
//! ```
//!
//! The tiled stream is `redundancy` frames back to back with nothing between
//! them; the next frame's sync pattern is the only delimiter. On the receive
//! side the recovered bits are split on the sync pattern and every segment is
//! a candidate `body ‖ digest` that must pass [`validate`] before it is
//! trusted.

use md5::{Digest, Md5};

use crate::stego::bits::{pack_bits, BitStream};

/// Synchronisation pattern that opens every frame.
pub const SYNC_PATTERN: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

/// Length of the integrity digest in bytes.
pub const CHECKSUM_LEN: usize = 16;

/// Fixed per-frame overhead: sync(4) + checksum(16) = 20 bytes.
pub const FRAME_OVERHEAD: usize = SYNC_PATTERN.len() + CHECKSUM_LEN;

/// A single payload frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The encrypted payload carried by this frame.
    pub body: Vec<u8>,
    /// MD5 digest of `body`.
    pub checksum: [u8; CHECKSUM_LEN],
}

impl Frame {
    /// Serialized length in bytes: sync + body + checksum.
    pub fn byte_len(&self) -> usize {
        FRAME_OVERHEAD + self.body.len()
    }

    /// Serialize as `sync ‖ body ‖ checksum`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        out.extend_from_slice(&SYNC_PATTERN);
        out.extend_from_slice(&self.body);
        out.extend_from_slice(&self.checksum);
        out
    }
}

/// MD5 digest of `data`.
pub fn digest(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&Md5::digest(data));
    out
}

/// Build a frame around `body`, computing its checksum.
pub fn build_frame(body: &[u8]) -> Frame {
    Frame {
        body: body.to_vec(),
        checksum: digest(body),
    }
}

/// Serialize `redundancy` consecutive copies of `frame` as bits, MSB first.
pub fn tile(frame: &Frame, redundancy: usize) -> BitStream {
    let bytes = frame.to_bytes();
    let mut bits = BitStream::with_capacity(bytes.len() * 8 * redundancy);
    for _ in 0..redundancy {
        bits.extend_bytes(&bytes);
    }
    bits
}

/// Bits of [`SYNC_PATTERN`], MSB first.
pub fn sync_bits() -> BitStream {
    BitStream::from_bytes(&SYNC_PATTERN)
}

/// Split recovered bits on the sync pattern and pack each segment into bytes.
///
/// Segments that are not a whole number of bytes, or that are too short to
/// hold a checksum, cannot be frames and are skipped.
pub fn recover_candidates(bits: &BitStream) -> Vec<Vec<u8>> {
    let sync = sync_bits();
    bits.split(sync.as_slice())
        .into_iter()
        .filter(|segment| segment.len() >= CHECKSUM_LEN * 8)
        .filter_map(pack_bits)
        .collect()
}

/// Accept `candidate` iff its trailing 16 bytes are the MD5 of the rest.
pub fn validate(candidate: &[u8]) -> Option<Frame> {
    if candidate.len() < CHECKSUM_LEN {
        return None;
    }
    let (body, claimed) = candidate.split_at(candidate.len() - CHECKSUM_LEN);
    let computed = digest(body);
    if computed.as_slice() != claimed {
        return None;
    }
    Some(Frame {
        body: body.to_vec(),
        checksum: computed,
    })
}
