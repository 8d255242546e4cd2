// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Mix the hidden signal into the original audio.

use crate::dsp::{Buffer, Shape, Stage, StageDescriptor};
use crate::stego::error::StegoError;

/// Weight of each input in the mix.
pub const MIX_WEIGHT: f64 = 0.5;

/// `0.5·original + 0.5·hidden`, truncated to the shorter input.
pub fn combine(original: &[f64], hidden: &[f64]) -> Vec<f64> {
    original
        .iter()
        .zip(hidden)
        .map(|(o, h)| MIX_WEIGHT * o + MIX_WEIGHT * h)
        .collect()
}

/// Combiner stage holding the original audio; the hidden signal flows in.
/// `pos` is how far into the original the hidden signal has reached.
pub struct Combiner {
    original: Vec<f64>,
    pos: usize,
}

impl Combiner {
    pub fn new(original: Vec<f64>) -> Self {
        Self { original, pos: 0 }
    }
}

impl Stage for Combiner {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "combiner",
            input: Shape::Real,
            output: Shape::Real,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let hidden = input.into_real("combiner")?;
        let start = self.pos.min(self.original.len());
        self.pos += hidden.len();
        Ok(Buffer::Real(combine(&self.original[start..], &hidden)))
    }

    fn finish(&mut self) -> Result<Buffer, StegoError> {
        self.pos = 0;
        Ok(Buffer::Real(Vec::new()))
    }
}
