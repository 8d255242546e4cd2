// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Gaussian frequency-shift keying modulator.
//!
//! Bits become NRZ symbols (0 → -1, 1 → +1) that are shaped by the GFSK
//! frequency pulse and integrated into phase, so the output is a
//! continuous-phase complex baseband signal `e^{jφ[n]}`.
//!
//! The frequency pulse is a one-symbol rectangle convolved with a Gaussian
//! whose bandwidth-time product is `bt`:
//!
//! ```text
//! p(x) = ½ · [erf(α(x + ½)) − erf(α(x − ½))],   α = π·bt·√(2 / ln 2)
//! ```
//!
//! with `x` in symbol periods. It peaks below 1, integrates to one symbol and
//! is truncated to ±2.5 symbols. Symbol `k` is centred on sample
//! `(k + ½)·sps`, so a receiver samples the discriminator there.

use std::f64::consts::{LN_2, PI, TAU};

use num_complex::Complex64;

use crate::dsp::{Buffer, Shape, Stage, StageDescriptor};
use crate::stego::bits::BitStream;
use crate::stego::config::ModemConfig;
use crate::stego::error::StegoError;

/// One-sided pulse support in symbols.
pub const PULSE_SPAN: f64 = 2.5;

/// Value of the GFSK frequency pulse at `x` symbol periods from its centre.
pub fn frequency_pulse(x: f64, bt: f64) -> f64 {
    let alpha = PI * bt * (2.0 / LN_2).sqrt();
    0.5 * (libm::erf(alpha * (x + 0.5)) - libm::erf(alpha * (x - 0.5)))
}

/// Pulse sampled for every offset a sample can have from the centres of the
/// five symbols that overlap it. Index `i` holds `p((i - 2.5·sps) / sps)`.
fn pulse_table(sps: usize, bt: f64) -> Vec<f64> {
    let span = (2.0 * PULSE_SPAN) as usize * sps;
    (0..span)
        .map(|i| {
            let x = (i as f64 - PULSE_SPAN * sps as f64) / sps as f64;
            frequency_pulse(x, bt)
        })
        .collect()
}

/// GFSK modulator stage: bits in, complex baseband out.
///
/// The bitstream is treated as a repeating source; the stage produces
/// exactly `n_samples` samples, wrapping around the bits as often as needed.
/// Each call takes a complete bitstream, so the encoder runs in one chunk.
pub struct GfskModulator {
    sps: usize,
    sensitivity: f64,
    pulse: Vec<f64>,
    n_samples: usize,
}

impl GfskModulator {
    pub fn new(config: &ModemConfig, n_samples: usize) -> Self {
        let sps = config.samples_per_symbol();
        Self {
            sps,
            sensitivity: config.sensitivity,
            pulse: pulse_table(sps, config.bt),
            n_samples,
        }
    }

    /// Shaped instantaneous frequency, in units of the full-scale deviation.
    pub fn shaped_frequency(&self, bits: &BitStream) -> Vec<f64> {
        let mut freq = vec![0.0; self.n_samples];
        if bits.is_empty() || self.sps == 0 {
            return freq;
        }
        let sps = self.sps;
        let symbol = |k: usize| -> f64 {
            match bits.get(k % bits.len()) {
                Some(true) => 1.0,
                _ => -1.0,
            }
        };

        for (n, f) in freq.iter_mut().enumerate() {
            let m = n / sps;
            let first = m.saturating_sub(2);
            let mut acc = 0.0;
            for k in first..=m + 2 {
                // n - k*sps + 2*sps, always inside the table for these k.
                let idx = n + 2 * sps - k * sps;
                if let Some(&p) = self.pulse.get(idx) {
                    acc += symbol(k) * p;
                }
            }
            *f = acc;
        }
        freq
    }

    /// Integrate the shaped frequency into continuous phase.
    pub fn modulate(&self, bits: &BitStream) -> Vec<Complex64> {
        let mut phase = 0.0f64;
        self.shaped_frequency(bits)
            .into_iter()
            .map(|f| {
                phase = (phase + self.sensitivity * f).rem_euclid(TAU);
                Complex64::from_polar(1.0, phase)
            })
            .collect()
    }
}

impl Stage for GfskModulator {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "gfsk modulator",
            input: Shape::Bits,
            output: Shape::Complex,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let bits = input.into_bits("gfsk modulator")?;
        Ok(Buffer::Complex(self.modulate(&bits)))
    }
}
