// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Windowed-sinc low-pass filter applied by FFT overlap-add.
//!
//! Tap design follows the classic Hann-window rule of thumb: the window's
//! 44 dB stopband sets the length to `44·fs / (22·transition)` taps, forced
//! odd so the filter has an integer group delay. Taps are normalised to unit
//! DC gain.
//!
//! The filter is linear-phase with a delay of `(ntaps - 1) / 2` samples.
//! [`LowPassFilter`] removes that delay, so output sample `n` lines up with
//! input sample `n` and the output is exactly as long as the input. When the
//! signal arrives in chunks, the convolution tail of each chunk is carried
//! into the next and the last `delay` samples come out of
//! [`LowPassFilter::flush`].

use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::dsp::{Buffer, Shape, Stage, StageDescriptor};
use crate::stego::error::StegoError;

/// Stopband attenuation of the Hann window in dB.
const HANN_ATTENUATION_DB: f64 = 44.0;

/// Number of taps for a Hann low-pass with the given transition width.
pub fn tap_count(sample_rate: u32, transition: f64) -> usize {
    let n = (HANN_ATTENUATION_DB * sample_rate as f64 / (22.0 * transition)) as usize;
    n.max(1) | 1
}

/// Hann window of length `n`.
pub fn hann(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Design low-pass taps with passband edge `cutoff` Hz.
pub fn design_low_pass(sample_rate: u32, cutoff: f64, transition: f64) -> Vec<f64> {
    let ntaps = tap_count(sample_rate, transition);
    let window = hann(ntaps);
    let m = (ntaps / 2) as isize;
    let w_c = 2.0 * PI * cutoff / sample_rate as f64;

    let mut taps: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let n = i as isize - m;
            let sinc = if n == 0 {
                w_c / PI
            } else {
                (n as f64 * w_c).sin() / (n as f64 * PI)
            };
            sinc * w
        })
        .collect();

    let gain: f64 = taps.iter().sum();
    if gain != 0.0 {
        taps.iter_mut().for_each(|t| *t /= gain);
    }
    taps
}

/// Complex low-pass stage with delay compensation.
pub struct LowPassFilter {
    taps: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    /// Spectrum of the zero-padded taps.
    kernel: Vec<Complex64>,
    /// Convolution output that spills past the last chunk pushed.
    tail: Vec<Complex64>,
    /// Leading output samples still to drop for delay compensation.
    skip: usize,
}

impl LowPassFilter {
    pub fn new(sample_rate: u32, cutoff: f64, transition: f64) -> Self {
        Self::from_taps(&design_low_pass(sample_rate, cutoff, transition))
    }

    pub fn from_taps(taps: &[f64]) -> Self {
        let fft_len = (2 * taps.len()).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut kernel = vec![Complex64::new(0.0, 0.0); fft_len];
        for (k, &t) in kernel.iter_mut().zip(taps) {
            *k = Complex64::new(t, 0.0);
        }
        forward.process(&mut kernel);

        let spill = taps.len().saturating_sub(1);
        Self {
            taps: taps.len(),
            fft_len,
            forward,
            inverse,
            kernel,
            tail: vec![Complex64::new(0.0, 0.0); spill],
            skip: spill / 2,
        }
    }

    pub fn tap_count(&self) -> usize {
        self.taps
    }

    /// Group delay in samples.
    pub fn delay(&self) -> usize {
        (self.taps.saturating_sub(1)) / 2
    }

    /// Filter `input`, returning a delay-compensated signal of equal length.
    pub fn filter(&self, input: &[Complex64]) -> Vec<Complex64> {
        if input.is_empty() || self.taps == 0 {
            return input.to_vec();
        }
        let mut full = self.convolve(input);
        full.drain(..self.delay());
        full.truncate(input.len());
        full
    }

    /// Filter the next chunk of a longer signal.
    ///
    /// Output trails the input by the group delay: the first `delay` samples
    /// pushed produce nothing, and [`LowPassFilter::flush`] releases the
    /// matching end of the signal.
    pub fn push(&mut self, input: &[Complex64]) -> Vec<Complex64> {
        if input.is_empty() || self.taps == 0 {
            return input.to_vec();
        }
        let mut full = self.convolve(input);
        for (f, t) in full.iter_mut().zip(&self.tail) {
            *f += *t;
        }
        self.tail = full.split_off(input.len());
        let dropped = self.skip.min(full.len());
        full.drain(..dropped);
        self.skip -= dropped;
        full
    }

    /// Release the delayed end of the signal and reset for a new one.
    pub fn flush(&mut self) -> Vec<Complex64> {
        let delay = self.delay();
        let out = self.tail[self.skip..delay].to_vec();
        self.tail.fill(Complex64::new(0.0, 0.0));
        self.skip = delay;
        out
    }

    /// Full linear convolution, `input.len() + taps - 1` samples long.
    fn convolve(&self, input: &[Complex64]) -> Vec<Complex64> {
        let zero = Complex64::new(0.0, 0.0);
        let block = self.fft_len - self.taps + 1;
        let scale = 1.0 / self.fft_len as f64;

        let mut full = vec![zero; input.len() + self.taps - 1];
        let mut buf = vec![zero; self.fft_len];
        for (i, chunk) in input.chunks(block).enumerate() {
            buf.fill(zero);
            buf[..chunk.len()].copy_from_slice(chunk);
            self.forward.process(&mut buf);
            for (b, k) in buf.iter_mut().zip(&self.kernel) {
                *b *= *k;
            }
            self.inverse.process(&mut buf);

            let start = i * block;
            let valid = chunk.len() + self.taps - 1;
            for (o, b) in full[start..start + valid].iter_mut().zip(&buf) {
                *o += *b * scale;
            }
        }
        full
    }
}

impl Stage for LowPassFilter {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "low-pass filter",
            input: Shape::Complex,
            output: Shape::Complex,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let samples = input.into_complex("low-pass filter")?;
        Ok(Buffer::Complex(self.push(&samples)))
    }

    fn finish(&mut self) -> Result<Buffer, StegoError> {
        Ok(Buffer::Complex(self.flush()))
    }
}
