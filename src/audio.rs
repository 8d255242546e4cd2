// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Mono 16-bit PCM WAV input and output.
//!
//! Samples are normalised to `f64` in `[-1, 1)` on read (`s / 32768`) and
//! clamped back to the 16-bit range on write (`s · 32767`).

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::stego::error::StegoError;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub samples: Vec<f64>,
}

impl PcmAudio {
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn from_i16(s: i16) -> f64 {
    s as f64 / 32_768.0
}

fn to_i16(s: f64) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16
}

/// Read a mono 16-bit PCM WAV file.
///
/// # Errors
/// [`StegoError::UnsupportedAudio`] for any other channel count or sample
/// format; [`StegoError::Wav`] when the file cannot be parsed.
pub fn read_wav(path: &Path) -> Result<PcmAudio, StegoError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(StegoError::UnsupportedAudio(format!(
            "{} has {} channels, expected mono",
            path.display(),
            spec.channels
        )));
    }
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(StegoError::UnsupportedAudio(format!(
            "{} is {}-bit {:?}, expected 16-bit PCM",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(from_i16))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        samples = samples.len(),
        "read wav"
    );
    Ok(PcmAudio::new(spec.sample_rate, samples))
}

/// Write `audio` as mono 16-bit PCM, clamping out-of-range samples.
pub fn write_wav(path: &Path, audio: &PcmAudio) -> Result<(), StegoError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in &audio.samples {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    debug!(path = %path.display(), samples = audio.len(), "wrote wav");
    Ok(())
}
