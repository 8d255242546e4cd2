// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Demodulator back end: discriminator, symbol timing and slicing.
//!
//! After the sub-band has been shifted to baseband and low-passed, the
//! quadrature discriminator turns phase steps back into the shaped
//! frequency, clock recovery picks one sample per symbol, and the slicer
//! decides each bit.

use std::io::Write;

use num_complex::Complex64;
use tracing::{debug, trace};

use crate::dsp::{Buffer, Shape, Stage, StageDescriptor};
use crate::stego::bits::BitStream;
use crate::stego::config::ModemConfig;
use crate::stego::error::StegoError;

/// Quadrature discriminator: `arg(y[n]·conj(y[n−1])) / sensitivity`.
///
/// The output has the input's length; the first sample is measured against
/// an implicit zero-phase predecessor, later chunks against the last sample
/// of the chunk before.
pub struct QuadratureDemod {
    gain: f64,
    prev: Complex64,
}

impl QuadratureDemod {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            gain: 1.0 / sensitivity,
            prev: Complex64::new(1.0, 0.0),
        }
    }

    pub fn demodulate(&mut self, samples: &[Complex64]) -> Vec<f64> {
        samples
            .iter()
            .map(|&s| {
                let d = s * self.prev.conj();
                self.prev = s;
                d.arg() * self.gain
            })
            .collect()
    }
}

impl Stage for QuadratureDemod {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "quadrature demod",
            input: Shape::Complex,
            output: Shape::Real,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let samples = input.into_complex("quadrature demod")?;
        Ok(Buffer::Real(self.demodulate(&samples)))
    }

    fn finish(&mut self) -> Result<Buffer, StegoError> {
        self.prev = Complex64::new(1.0, 0.0);
        Ok(Buffer::Real(Vec::new()))
    }
}

/// Mueller-Müller symbol clock recovery.
///
/// Emits one interpolated sample per symbol. The first sample is taken
/// `mu` symbols into the stream; each later one a symbol period further,
/// nudged by `gain_mu · e` where
/// `e = sgn(prev)·cur − sgn(cur)·prev`, clamped to
/// `±omega_relative_limit` of a period.
///
/// The nominal period stays fixed at the configured samples per symbol:
/// both ends of the channel read the same sample clock.
///
/// Input may arrive in chunks. Samples the next symbol can still reach are
/// kept in `history`, indexed from absolute sample `base`.
pub struct ClockRecovery {
    omega: f64,
    mu: f64,
    gain_mu: f64,
    limit: f64,
    history: Vec<f64>,
    base: usize,
    /// Absolute time of the next symbol, in samples.
    t: f64,
    /// Previous symbol value; `None` before the first decision.
    prev: Option<f64>,
    drift: f64,
    symbols: usize,
}

impl ClockRecovery {
    pub fn new(config: &ModemConfig) -> Self {
        let omega = config.samples_per_symbol() as f64;
        Self {
            omega,
            mu: config.mu,
            gain_mu: config.gain_mu,
            limit: config.omega_relative_limit * omega,
            history: Vec::new(),
            base: 0,
            t: config.mu * omega,
            prev: None,
            drift: 0.0,
            symbols: 0,
        }
    }

    /// Symbols for the next chunk of samples.
    pub fn recover(&mut self, samples: &[f64]) -> Vec<f64> {
        self.history.extend_from_slice(samples);
        let end = self.base + self.history.len();
        let mut out = Vec::with_capacity(samples.len() / self.omega.max(1.0) as usize + 1);

        loop {
            let i = self.t.floor() as usize;
            if i + 1 >= end {
                break;
            }
            let frac = self.t - i as f64;
            let (a, b) = (self.history[i - self.base], self.history[i + 1 - self.base]);
            let cur = a * (1.0 - frac) + b * frac;
            // No timing error until there is a previous decision.
            let err = match self.prev {
                Some(prev) => slice(prev) * cur - slice(cur) * prev,
                None => 0.0,
            };
            out.push(cur);

            let adjust = (self.gain_mu * err).clamp(-self.limit, self.limit);
            self.drift += adjust;
            self.prev = Some(cur);
            self.t += self.omega + adjust;
        }

        let keep_from = (self.t.floor() as usize).clamp(self.base, end);
        self.history.drain(..keep_from - self.base);
        self.base = keep_from;
        self.symbols += out.len();
        out
    }

    fn reset(&mut self) {
        self.history.clear();
        self.base = 0;
        self.t = self.mu * self.omega;
        self.prev = None;
        self.drift = 0.0;
        self.symbols = 0;
    }
}

/// Hard decision used by the timing error detector.
fn slice(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl Stage for ClockRecovery {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "clock recovery",
            input: Shape::Real,
            output: Shape::Real,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let samples = input.into_real("clock recovery")?;
        Ok(Buffer::Real(self.recover(&samples)))
    }

    fn finish(&mut self) -> Result<Buffer, StegoError> {
        debug!(
            symbols = self.symbols,
            drift = self.drift,
            "clock recovery done"
        );
        self.reset();
        Ok(Buffer::Real(Vec::new()))
    }
}

/// Binary slicer: `value > 0` is a one.
///
/// An optional tap receives every decided bit as a `0x00`/`0x01` byte. Bits
/// are written and flushed chunk by chunk as they are decided, so a run
/// stopped part way leaves every bit decided so far in the tap.
#[derive(Default)]
pub struct BinarySlicer {
    tap: Option<Box<dyn Write>>,
}

impl BinarySlicer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tap(tap: Box<dyn Write>) -> Self {
        Self { tap: Some(tap) }
    }

    pub fn slice(samples: &[f64]) -> BitStream {
        samples.iter().map(|&s| s > 0.0).collect()
    }
}

impl Stage for BinarySlicer {
    fn descriptor(&self) -> StageDescriptor {
        StageDescriptor {
            name: "binary slicer",
            input: Shape::Real,
            output: Shape::Bits,
        }
    }

    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let samples = input.into_real("binary slicer")?;
        let bits = Self::slice(&samples);
        if let Some(tap) = self.tap.as_mut() {
            let io = |source| StegoError::Io {
                stage: "bit dump",
                source,
            };
            for bit in bits.iter() {
                tap.write_all(&[bit as u8]).map_err(io)?;
            }
            tap.flush().map_err(io)?;
            trace!(bits = bits.len(), "bits written to tap");
        }
        Ok(Buffer::Bits(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn discriminator_recovers_phase_steps() {
        let steps = [0.02, -0.01, 0.015, 0.0, -0.02];
        let mut phase = 0.0;
        let signal: Vec<Complex64> = steps
            .iter()
            .map(|s| {
                phase += s;
                Complex64::from_polar(0.25, phase)
            })
            .collect();
        let out = QuadratureDemod::new(0.01).demodulate(&signal);
        for (o, s) in out.iter().zip(steps) {
            assert!((o - s / 0.01).abs() < 1e-9, "{o} vs {}", s / 0.01);
        }
    }

    #[test]
    fn discriminator_handles_wraparound() {
        let a = Complex64::from_polar(1.0, 3.1);
        let b = Complex64::from_polar(1.0, -3.1);
        let out = QuadratureDemod::new(1.0).demodulate(&[a, b]);
        assert!((out[1] - (2.0 * std::f64::consts::PI - 6.2)).abs() < 1e-9);
    }

    fn square_wave(symbols: &[f64], sps: usize) -> Vec<f64> {
        symbols
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(sps))
            .collect()
    }

    fn config_with_sps(sps: u32) -> ModemConfig {
        ModemConfig {
            sample_rate: sps * 100,
            bit_rate: 100,
            ..ModemConfig::default()
        }
    }

    #[test]
    fn clock_recovery_samples_symbol_centres() {
        let symbols = [1.0, -1.0, -1.0, 1.0, 1.0, 1.0, -1.0, 1.0];
        let input = square_wave(&symbols, 40);
        let out = ClockRecovery::new(&config_with_sps(40)).recover(&input);
        assert_eq!(out, symbols.to_vec());
    }

    #[test]
    fn clock_recovery_correction_is_bounded() {
        // Alternating extremes push the detector as hard as it goes.
        let input: Vec<f64> = (0..4_000)
            .map(|n| if n % 3 == 0 { 50.0 } else { -50.0 })
            .collect();
        let cfg = config_with_sps(40);
        let out = ClockRecovery::new(&cfg).recover(&input);
        // Every period is within 1% of 40 samples.
        assert!(
            out.len() >= 4_000 / 41 - 1 && out.len() <= 4_000 / 39 + 1,
            "{}",
            out.len()
        );
    }

    #[test]
    fn clock_recovery_across_chunks() {
        let input: Vec<f64> = (0..3_000)
            .map(|n| (n as f64 * 0.021).sin() + 0.3 * (n as f64 * 0.17).cos())
            .collect();
        let cfg = config_with_sps(40);
        let whole = ClockRecovery::new(&cfg).recover(&input);

        let mut stage = ClockRecovery::new(&cfg);
        let mut chunked = Vec::new();
        for chunk in input.chunks(33) {
            chunked.extend(stage.recover(chunk));
        }
        assert_eq!(chunked, whole);
        // Old samples are released once no symbol can reach them.
        assert!(stage.history.len() <= 1);

        stage.finish().unwrap();
        assert_eq!(stage.recover(&input), whole);
    }

    #[test]
    fn discriminator_across_chunks() {
        let signal: Vec<Complex64> = (0..50)
            .map(|n| Complex64::from_polar(1.0, n as f64 * 0.03))
            .collect();
        let mut demod = QuadratureDemod::new(0.03);
        let mut out = demod.demodulate(&signal[..20]);
        out.extend(demod.demodulate(&signal[20..]));
        // Only the first sample sees the zero-phase predecessor.
        for (n, o) in out.iter().enumerate().skip(1) {
            assert!((o - 1.0).abs() < 1e-9, "sample {n}: {o}");
        }
    }

    #[test]
    fn clock_recovery_on_short_input() {
        let cfg = config_with_sps(40);
        assert!(ClockRecovery::new(&cfg).recover(&[]).is_empty());
        assert!(ClockRecovery::new(&cfg).recover(&[1.0; 10]).is_empty());
    }

    #[test]
    fn slicer_thresholds_at_zero() {
        let bits = BinarySlicer::slice(&[0.3, -0.2, 0.0, 1e-9]);
        assert_eq!(bits.as_slice(), &[true, false, false, true]);
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn slicer_tap_receives_one_byte_per_bit() {
        let sink = Shared::default();
        let mut slicer = BinarySlicer::with_tap(Box::new(sink.clone()));
        let out = slicer.process(Buffer::Real(vec![1.0, -1.0, 2.0])).unwrap();
        assert_eq!(out, Buffer::Bits(vec![true, false, true].into()));
        assert_eq!(*sink.0.borrow(), vec![1, 0, 1]);

        slicer.process(Buffer::Real(vec![-0.5])).unwrap();
        assert_eq!(*sink.0.borrow(), vec![1, 0, 1, 0]);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn slicer_tap_failure_is_reported() {
        let mut slicer = BinarySlicer::with_tap(Box::new(Broken));
        let err = slicer.process(Buffer::Real(vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            StegoError::Io {
                stage: "bit dump",
                ..
            }
        ));
    }
}
