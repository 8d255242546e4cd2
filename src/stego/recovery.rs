// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Frame recovery from a demodulated bitstream.
//!
//! Candidates are examined in the order they occur in the stream and the
//! first one whose checksum matches wins. Malformed or corrupted repetitions
//! are skipped; only running out of candidates is an error.

use tracing::{debug, trace};

use crate::stego::bits::BitStream;
use crate::stego::error::StegoError;
use crate::stego::frame::{self, Frame};

/// Outcome of a successful recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    /// The frame that passed validation.
    pub frame: Frame,
    /// Zero-based index of the winning candidate.
    pub candidate_index: usize,
    /// Total candidates found in the stream.
    pub candidates: usize,
}

impl Recovered {
    pub fn body(&self) -> &[u8] {
        &self.frame.body
    }

    /// Candidates that were rejected before the winner.
    pub fn rejected(&self) -> usize {
        self.candidate_index
    }
}

/// Recovery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryState {
    /// Still examining candidates; `next` is the index to try.
    Scanning { next: usize },
    /// A candidate validated.
    Recovered(Recovered),
    /// Every candidate was rejected.
    Failed { candidates: usize },
}

impl RecoveryState {
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Scanning { .. })
    }
}

/// Scans split candidates until one validates or none are left.
pub struct FrameRecovery {
    candidates: Vec<Vec<u8>>,
    state: RecoveryState,
}

impl FrameRecovery {
    pub fn new(bits: &BitStream) -> Self {
        let candidates = frame::recover_candidates(bits);
        debug!(
            bits = bits.len(),
            candidates = candidates.len(),
            "split recovered bitstream"
        );
        Self {
            candidates,
            state: RecoveryState::Scanning { next: 0 },
        }
    }

    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    /// Examine one candidate and return the resulting state.
    pub fn step(&mut self) -> &RecoveryState {
        if let RecoveryState::Scanning { next } = self.state {
            self.state = match self.candidates.get(next) {
                None => RecoveryState::Failed {
                    candidates: self.candidates.len(),
                },
                Some(candidate) => match frame::validate(candidate) {
                    Some(frame) => RecoveryState::Recovered(Recovered {
                        frame,
                        candidate_index: next,
                        candidates: self.candidates.len(),
                    }),
                    None => {
                        trace!(
                            index = next,
                            len = candidate.len(),
                            "candidate failed checksum"
                        );
                        RecoveryState::Scanning { next: next + 1 }
                    }
                },
            };
        }
        &self.state
    }

    /// Drive the scan to completion.
    ///
    /// # Errors
    /// [`StegoError::IntegrityFailure`] when no candidate validates.
    pub fn run(mut self) -> Result<Recovered, StegoError> {
        while !self.step().is_done() {}
        match self.state {
            RecoveryState::Recovered(recovered) => Ok(recovered),
            RecoveryState::Failed { candidates } => {
                Err(StegoError::IntegrityFailure { candidates })
            }
            RecoveryState::Scanning { .. } => unreachable!("scan loop exits only when done"),
        }
    }
}

/// Recover the first valid frame from `bits`.
pub fn recover(bits: &BitStream) -> Result<Recovered, StegoError> {
    FrameRecovery::new(bits).run()
}
