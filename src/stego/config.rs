// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Modem run configuration.
//!
//! A [`ModemConfig`] is built once per run and handed by reference to every
//! stage constructor. Encoder and decoder must agree on every field.

use std::f64::consts::PI;

use crate::dsp::fir::tap_count;
use crate::stego::error::StegoError;

/// Default audio sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default hidden-channel bit rate (one GFSK symbol per bit).
pub const DEFAULT_BIT_RATE: u32 = 100;

/// Distance of the default carrier below the Nyquist frequency, in Hz.
pub const CARRIER_BELOW_NYQUIST: f64 = 1000.0;

/// Longest demodulator low-pass accepted, in taps.
pub const MAX_FILTER_TAPS: usize = 1 << 18;

/// Parameters shared by the modulator, combiner and demodulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Hidden-channel bits per second.
    pub bit_rate: u32,
    /// Centre of the hidden sub-band, in Hz away from baseband.
    pub carrier_offset: f64,
    /// Phase advance in radians per sample for a full-scale symbol.
    pub sensitivity: f64,
    /// Gaussian pulse-shaping bandwidth-time product.
    pub bt: f64,
    /// Low-pass passband edge used by the demodulator, in Hz.
    pub cutoff: f64,
    /// Low-pass transition width, in Hz.
    pub transition: f64,
    /// Initial timing offset within a symbol, as a fraction of the symbol.
    pub mu: f64,
    /// Clock recovery loop gain.
    pub gain_mu: f64,
    /// Largest timing correction per symbol, relative to the symbol period.
    pub omega_relative_limit: f64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self::for_sample_rate(DEFAULT_SAMPLE_RATE)
    }
}

impl ModemConfig {
    /// Reference parameters for a given sample rate. The carrier sits
    /// [`CARRIER_BELOW_NYQUIST`] Hz under the Nyquist frequency.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bit_rate: DEFAULT_BIT_RATE,
            carrier_offset: sample_rate as f64 / 2.0 - CARRIER_BELOW_NYQUIST,
            sensitivity: 0.01,
            bt: 0.35,
            cutoff: 200.0,
            transition: 10.0,
            mu: 0.5,
            gain_mu: 0.175,
            omega_relative_limit: 0.01,
        }
    }

    /// Samples per modulated symbol (one symbol carries one bit).
    pub fn samples_per_symbol(&self) -> usize {
        (self.sample_rate / self.bit_rate.max(1)) as usize
    }

    /// Peak frequency deviation of the GFSK signal, in Hz.
    pub fn deviation_hz(&self) -> f64 {
        self.sensitivity * self.sample_rate as f64 / (2.0 * PI)
    }

    /// Check that the parameters describe a usable channel.
    ///
    /// # Errors
    /// Returns [`StegoError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), StegoError> {
        let invalid =
            |msg: String| -> Result<(), StegoError> { Err(StegoError::InvalidConfig(msg)) };
        let nyquist = self.sample_rate as f64 / 2.0;

        let fields = [
            ("carrier offset", self.carrier_offset),
            ("sensitivity", self.sensitivity),
            ("bt", self.bt),
            ("cutoff", self.cutoff),
            ("transition", self.transition),
            ("mu", self.mu),
            ("gain_mu", self.gain_mu),
            ("omega relative limit", self.omega_relative_limit),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{name} {value} must be a finite number"));
        }
        if self.sample_rate == 0 {
            return invalid("sample rate must be positive".into());
        }
        if self.bit_rate == 0 || self.samples_per_symbol() < 2 {
            return invalid(format!(
                "bit rate {} leaves fewer than 2 samples per symbol at {} Hz",
                self.bit_rate, self.sample_rate
            ));
        }
        if !(self.sensitivity > 0.0 && self.sensitivity < PI) {
            return invalid(format!("sensitivity {} must lie in (0, pi)", self.sensitivity));
        }
        if !(self.bt > 0.0) {
            return invalid(format!("bt {} must be positive", self.bt));
        }
        if !(self.cutoff > 0.0 && self.transition > 0.0) {
            return invalid("low-pass cutoff and transition must be positive".into());
        }
        let taps = tap_count(self.sample_rate, self.transition);
        if taps > MAX_FILTER_TAPS {
            return invalid(format!(
                "transition {} Hz needs a {taps}-tap low-pass (limit {MAX_FILTER_TAPS})",
                self.transition
            ));
        }
        if self.deviation_hz() >= self.cutoff {
            return invalid(format!(
                "frequency deviation {:.1} Hz does not fit under the {} Hz low-pass",
                self.deviation_hz(),
                self.cutoff
            ));
        }
        let edge = self.cutoff + self.transition;
        if self.carrier_offset <= edge || self.carrier_offset + edge >= nyquist {
            return invalid(format!(
                "carrier offset {} Hz must leave {edge} Hz of room inside (0, {nyquist})",
                self.carrier_offset
            ));
        }
        if !(0.0..1.0).contains(&self.mu) {
            return invalid(format!("mu {} must lie in [0, 1)", self.mu));
        }
        if !(self.gain_mu >= 0.0 && self.omega_relative_limit >= 0.0) {
            return invalid("clock recovery gains must not be negative".into());
        }
        Ok(())
    }
}
