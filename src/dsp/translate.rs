// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Frequency translation and complex-to-real conversion.

use std::f64::consts::TAU;

use num_complex::Complex64;

use crate::dsp::{Buffer, Shape, Stage, StageDescriptor};
use crate::stego::error::StegoError;

/// Numerically controlled oscillator producing `e^{j·2π·f·n/fs}`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f64,
    step: f64,
}

impl Oscillator {
    pub fn new(frequency: f64, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate as f64,
        }
    }

    /// Next oscillator sample; the phase starts at zero.
    pub fn next_sample(&mut self) -> Complex64 {
        let out = Complex64::from_polar(1.0, self.phase);
        self.phase = (self.phase + self.step).rem_euclid(TAU);
        out
    }
}

/// Shift a signal by `frequency` Hz (negative shifts down).
///
/// Accepts real or complex input, chosen at construction; always produces
/// complex output. The oscillator phase runs on from one chunk to the next.
pub struct FrequencyTranslator {
    frequency: f64,
    sample_rate: u32,
    input: Shape,
    osc: Oscillator,
}

impl FrequencyTranslator {
    pub fn new(frequency: f64, sample_rate: u32, input: Shape) -> Self {
        Self {
            frequency,
            sample_rate,
            input,
            osc: Oscillator::new(frequency, sample_rate),
        }
    }

    pub fn translate_complex(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| s * self.osc.next_sample()).collect()
    }

    pub fn translate_real(&mut self, samples: &[f64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.osc.next_sample() * s).collect()
    }
}

impl Stage for FrequencyTranslator {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "frequency translator",
            input: self.input,
            output: Shape::Complex,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        match input {
            Buffer::Complex(c) if self.input == Shape::Complex => {
                Ok(Buffer::Complex(self.translate_complex(&c)))
            }
            Buffer::Real(r) if self.input == Shape::Real => {
                Ok(Buffer::Complex(self.translate_real(&r)))
            }
            _ => Err(StegoError::UnexpectedBuffer {
                stage: "frequency translator",
            }),
        }
    }

    fn finish(&mut self) -> Result<Buffer, StegoError> {
        self.osc = Oscillator::new(self.frequency, self.sample_rate);
        Ok(Buffer::Complex(Vec::new()))
    }
}

/// Keep the real component of a complex signal.
pub struct ComplexToReal;

impl Stage for ComplexToReal {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "complex to real",
            input: Shape::Complex,
            output: Shape::Real,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let c = input.into_complex("complex to real")?;
        Ok(Buffer::Real(c.into_iter().map(|s| s.re).collect()))
    }
}
