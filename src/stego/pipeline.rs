// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Hide and reveal a payload in PCM audio.
//!
//! Hiding:
//! 1. Frame the payload (`sync ‖ body ‖ md5`) and plan how often it fits
//! 2. Tile that many copies into one bitstream
//! 3. Run the encoder graph: GFSK modulate, shift to the carrier, mix 50/50
//!    with the original
//!
//! Revealing streams the captured audio through the decoder graph one
//! second at a time and hands the recovered bits to frame recovery.

use std::io::Write;

use tracing::info;

use crate::audio::PcmAudio;
use crate::dsp::graph::{demodulate_with_tap, encoder_pipeline};
use crate::dsp::Buffer;
use crate::stego::capacity::CapacityReport;
use crate::stego::config::ModemConfig;
use crate::stego::error::StegoError;
use crate::stego::frame::{build_frame, tile};
use crate::stego::recovery::{self, Recovered};

fn check_sample_rate(audio: &PcmAudio, config: &ModemConfig) -> Result<(), StegoError> {
    if audio.sample_rate != config.sample_rate {
        return Err(StegoError::UnsupportedAudio(format!(
            "audio is sampled at {} Hz but the modem is configured for {} Hz",
            audio.sample_rate, config.sample_rate
        )));
    }
    Ok(())
}

/// Hide `payload` in `original`, returning the mixed audio and the plan.
///
/// The output has exactly as many samples as `original`.
///
/// # Errors
/// - [`StegoError::InvalidConfig`] if `config` does not validate.
/// - [`StegoError::UnsupportedAudio`] if the audio's sample rate differs from
///   the configured one.
/// - [`StegoError::CapacityExceeded`] if one frame does not fit; nothing is
///   modulated in that case.
pub fn hide(
    original: &PcmAudio,
    payload: &[u8],
    config: &ModemConfig,
) -> Result<(PcmAudio, CapacityReport), StegoError> {
    config.validate()?;
    check_sample_rate(original, config)?;

    let report = CapacityReport::new(
        original.sample_rate,
        original.len(),
        config.samples_per_symbol(),
        payload.len(),
    );
    if report.redundancy == 0 {
        return Err(StegoError::CapacityExceeded {
            frame_bits: report.frame_bits,
            capacity_bits: report.capacity_bits,
        });
    }
    info!(
        capacity_bits = report.capacity_bits,
        frame_bits = report.frame_bits,
        redundancy = report.redundancy,
        "planned hidden channel"
    );

    let frame = build_frame(payload);
    let bits = tile(&frame, report.redundancy);
    let mut pipeline = encoder_pipeline(config, original.samples.clone())?;
    let mixed = pipeline.run(Buffer::Bits(bits))?.into_real("encoder")?;

    Ok((PcmAudio::new(original.sample_rate, mixed), report))
}

/// Recover the hidden frame from `captured`.
///
/// # Errors
/// [`StegoError::IntegrityFailure`] when no repetition survived, plus the
/// configuration errors of [`hide`].
pub fn reveal(captured: &PcmAudio, config: &ModemConfig) -> Result<Recovered, StegoError> {
    reveal_with_tap(captured, config, None)
}

/// [`reveal`], additionally copying every demodulated bit to `tap` as a
/// `0x00`/`0x01` byte. The tap is written as decoding progresses, so it
/// holds the bits decided so far even if the run stops early.
pub fn reveal_with_tap(
    captured: &PcmAudio,
    config: &ModemConfig,
    tap: Option<Box<dyn Write>>,
) -> Result<Recovered, StegoError> {
    config.validate()?;
    check_sample_rate(captured, config)?;

    let bits = demodulate_with_tap(config, &captured.samples, tap)?;
    info!(bits = bits.len(), "demodulated hidden channel");

    let recovered = recovery::recover(&bits)?;
    info!(
        candidate = recovered.candidate_index,
        candidates = recovered.candidates,
        rejected = recovered.rejected(),
        body_len = recovered.body().len(),
        "recovered frame"
    );
    Ok(recovered)
}
