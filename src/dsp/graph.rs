// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! The two stage graphs used by the hiding pipeline.
//!
//! ```text
//! encode:  bits → gfsk modulator → translator(+fc) → complex to real
//!               → combiner(original) → audio
//! decode:  audio → translator(−fc) → low-pass → quadrature demod
//!                → clock recovery → slicer → bits
//! ```
//!
//! The modulator is sized to the original audio, so the hidden stream is
//! never longer than the carrier it is mixed into. Captured audio is decoded
//! one second at a time, so a bit tap fills while the run is in progress.

use std::io::Write;

use crate::dsp::combine::Combiner;
use crate::dsp::demod::{BinarySlicer, ClockRecovery, QuadratureDemod};
use crate::dsp::fir::LowPassFilter;
use crate::dsp::gfsk::GfskModulator;
use crate::dsp::translate::{ComplexToReal, FrequencyTranslator};
use crate::dsp::{Buffer, Pipeline, Shape, Stage};
use crate::stego::bits::BitStream;
use crate::stego::config::ModemConfig;
use crate::stego::error::StegoError;

/// Stages that turn bits into the real-valued hidden signal.
fn modulator_stages(config: &ModemConfig, n_samples: usize) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(4);
    stages.push(Box::new(GfskModulator::new(config, n_samples)));
    stages.push(Box::new(FrequencyTranslator::new(
        config.carrier_offset,
        config.sample_rate,
        Shape::Complex,
    )));
    stages.push(Box::new(ComplexToReal));
    stages
}

/// Bits in, original audio with the hidden signal mixed in out.
pub fn encoder_pipeline(config: &ModemConfig, original: Vec<f64>) -> Result<Pipeline, StegoError> {
    let mut stages = modulator_stages(config, original.len());
    stages.push(Box::new(Combiner::new(original)));
    Pipeline::build(stages)
}

/// Captured audio in, raw recovered bits out. `tap` receives a copy of
/// every decided bit.
pub fn decoder_pipeline(
    config: &ModemConfig,
    tap: Option<Box<dyn Write>>,
) -> Result<Pipeline, StegoError> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(5);
    stages.push(Box::new(FrequencyTranslator::new(
        -config.carrier_offset,
        config.sample_rate,
        Shape::Real,
    )));
    stages.push(Box::new(LowPassFilter::new(
        config.sample_rate,
        config.cutoff,
        config.transition,
    )));
    stages.push(Box::new(QuadratureDemod::new(config.sensitivity)));
    stages.push(Box::new(ClockRecovery::new(config)));
    stages.push(Box::new(match tap {
        Some(tap) => BinarySlicer::with_tap(tap),
        None => BinarySlicer::new(),
    }));
    Pipeline::build(stages)
}

/// Modulate `bits` onto the carrier without mixing, producing exactly
/// `n_samples` real samples.
pub fn modulate(
    config: &ModemConfig,
    bits: &BitStream,
    n_samples: usize,
) -> Result<Vec<f64>, StegoError> {
    let mut pipeline = Pipeline::build(modulator_stages(config, n_samples))?;
    pipeline
        .run(Buffer::Bits(bits.clone()))?
        .into_real("modulator")
}

/// Demodulate captured audio into raw bits.
pub fn demodulate(config: &ModemConfig, captured: &[f64]) -> Result<BitStream, StegoError> {
    demodulate_with_tap(config, captured, None)
}

/// [`demodulate`], copying every bit to `tap` as soon as it is decided.
pub fn demodulate_with_tap(
    config: &ModemConfig,
    captured: &[f64],
    tap: Option<Box<dyn Write>>,
) -> Result<BitStream, StegoError> {
    let mut pipeline = decoder_pipeline(config, tap)?;
    let chunk_len = (config.sample_rate as usize).max(1);
    let expected = captured.len() / config.samples_per_symbol().max(1);
    let mut bits = BitStream::with_capacity(expected);
    for chunk in captured.chunks(chunk_len) {
        let decided = pipeline
            .feed(Buffer::Real(chunk.to_vec()))?
            .into_bits("demodulator")?;
        bits.extend(decided.iter());
    }
    if let Some(rest) = pipeline.finish()? {
        bits.extend(rest.into_bits("demodulator")?.iter());
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use rustfft::FftPlanner;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_config() -> ModemConfig {
        ModemConfig::for_sample_rate(8_000)
    }

    fn test_bits() -> BitStream {
        BitStream::from_bytes(&[0x3C, 0xA5, 0x0F, 0x96, 0x71, 0xE2, 0x5A, 0xC3])
    }

    #[test]
    fn graphs_are_shape_checked() {
        let cfg = test_config();
        let enc = encoder_pipeline(&cfg, vec![0.0; 100]).unwrap();
        assert_eq!(enc.input_shape(), Some(Shape::Bits));
        assert_eq!(enc.output_shape(), Some(Shape::Real));
        let names: Vec<_> = enc.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [
                "gfsk modulator",
                "frequency translator",
                "complex to real",
                "combiner"
            ]
        );

        let dec = decoder_pipeline(&cfg, None).unwrap();
        assert_eq!(dec.input_shape(), Some(Shape::Real));
        assert_eq!(dec.output_shape(), Some(Shape::Bits));
        assert_eq!(dec.descriptors().len(), 5);
    }

    #[test]
    fn hidden_signal_is_bounded() {
        let cfg = test_config();
        let out = modulate(&cfg, &test_bits(), 6_000).unwrap();
        assert_eq!(out.len(), 6_000);
        assert!(out.iter().all(|s| s.abs() <= 1.0 + 1e-12));
    }

    #[test]
    fn hidden_energy_sits_near_the_carrier() {
        let cfg = test_config();
        let n = cfg.samples_per_symbol() * 64;
        let out = modulate(&cfg, &test_bits(), n).unwrap();

        let mut spectrum: Vec<Complex64> = out.iter().map(|&s| Complex64::new(s, 0.0)).collect();
        FftPlanner::<f64>::new()
            .plan_fft_forward(n)
            .process(&mut spectrum);

        let bin_hz = cfg.sample_rate as f64 / n as f64;
        let (mut near, mut total) = (0.0, 0.0);
        for (k, c) in spectrum.iter().enumerate() {
            let hz = if k <= n / 2 {
                k as f64 * bin_hz
            } else {
                (n - k) as f64 * bin_hz
            };
            let e = c.norm_sqr();
            total += e;
            if (hz - cfg.carrier_offset).abs() <= 300.0 {
                near += e;
            }
        }
        assert!(
            near / total > 0.98,
            "only {:.3} of the energy near the carrier",
            near / total
        );
    }

    #[test]
    fn modulate_then_demodulate() {
        let cfg = test_config();
        let bits = test_bits();
        let n = cfg.samples_per_symbol() * bits.len();
        let hidden = modulate(&cfg, &bits, n).unwrap();
        let recovered = demodulate(&cfg, &hidden).unwrap();
        assert_eq!(recovered.len(), bits.len());
        // The filter is still filling over the first and last few symbols.
        for k in 4..bits.len() - 4 {
            assert_eq!(recovered.get(k), bits.get(k), "bit {k}");
        }
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
    fn tap_fills_before_the_input_ends() {
        let cfg = test_config();
        let bits = test_bits();
        let n = cfg.samples_per_symbol() * bits.len();
        let hidden = modulate(&cfg, &bits, n).unwrap();

        let sink = Shared::default();
        let tap: Box<dyn Write> = Box::new(sink.clone());
        let mut dec = decoder_pipeline(&cfg, Some(tap)).unwrap();
        dec.feed(Buffer::Real(hidden[..n / 2].to_vec())).unwrap();
        let early = sink.0.borrow().len();
        assert!(
            early > 0 && early < bits.len(),
            "{early} bits after half the audio"
        );

        dec.feed(Buffer::Real(hidden[n / 2..].to_vec())).unwrap();
        dec.finish().unwrap();
        let dump: Vec<bool> = sink.0.borrow().iter().map(|&b| b == 1).collect();
        assert_eq!(dump, demodulate(&cfg, &hidden).unwrap().as_slice());
    }

    #[test]
    fn chunk_size_does_not_change_the_bits() {
        let cfg = test_config();
        let bits = BitStream::from_bytes(&[0x3C, 0xA5, 0x0F, 0x96].repeat(8));
        let n = cfg.samples_per_symbol() * bits.len();
        let hidden = modulate(&cfg, &bits, n).unwrap();

        let whole = decoder_pipeline(&cfg, None)
            .unwrap()
            .run(Buffer::Real(hidden.clone()))
            .unwrap()
            .into_bits("test")
            .unwrap();
        // `demodulate` feeds one second (8 000 samples) at a time.
        assert!(n > 2 * cfg.sample_rate as usize);
        assert_eq!(demodulate(&cfg, &hidden).unwrap(), whole);
    }

    #[test]
    fn encoder_output_matches_original_length() {
        let cfg = test_config();
        let mut enc = encoder_pipeline(&cfg, vec![0.1; 1_234]).unwrap();
        let out = enc.run(Buffer::Bits(test_bits())).unwrap();
        assert_eq!(out.len(), 1_234);
    }
}
