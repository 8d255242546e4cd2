// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! File-level encode/decode with a stand-in transcoder.
//!
//! The "video container" in these tests is a plain WAV file: extraction
//! copies it and remuxing copies the modified audio to the output.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use hushband::{
    decode_file, encode_file, write_wav, AesGcmSivCipher, ModemConfig, PcmAudio, RunContext,
    StegoError, Transcoder,
};

struct WavPassthrough;

impl Transcoder for WavPassthrough {
    fn check_available(&self) -> Result<(), StegoError> {
        Ok(())
    }

    fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), StegoError> {
        fs::copy(video, wav)
            .map(drop)
            .map_err(|source| StegoError::Io {
                stage: "audio extraction",
                source,
            })
    }

    fn replace_audio(&self, _video: &Path, wav: &Path, output: &Path) -> Result<(), StegoError> {
        fs::copy(wav, output)
            .map(drop)
            .map_err(|source| StegoError::Io {
                stage: "remux",
                source,
            })
    }
}

struct MissingTools;

impl Transcoder for MissingTools {
    fn check_available(&self) -> Result<(), StegoError> {
        Err(StegoError::ExternalTool {
            stage: "dependency check",
            detail: "ffmpeg not found".into(),
        })
    }

    fn extract_audio(&self, _: &Path, _: &Path) -> Result<(), StegoError> {
        unreachable!("dependency check fails first")
    }

    fn replace_audio(&self, _: &Path, _: &Path, _: &Path) -> Result<(), StegoError> {
        unreachable!("dependency check fails first")
    }
}

fn carrier_video(path: &Path, sample_rate: u32, seconds: f64) {
    let n = (sample_rate as f64 * seconds) as usize;
    let samples = (0..n)
        .map(|i| 0.3 * (2.0 * PI * 330.0 * i as f64 / sample_rate as f64).sin())
        .collect();
    write_wav(path, &PcmAudio::new(sample_rate, samples)).unwrap();
}

#[test]
fn encode_then_decode_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    let video = dir.path().join("clip.wav");
    let encoded = dir.path().join("clip_hushband.wav");
    let decoded = dir.path().join("secret.out");
    let bits = dir.path().join("bits.raw");

    fs::write(&input, b"meet me by the pier").unwrap();
    carrier_video(&video, 8_000, 24.0);

    let ctx = RunContext {
        config: ModemConfig::for_sample_rate(8_000),
        cipher: &AesGcmSivCipher,
        transcoder: &WavPassthrough,
        keep_temp: false,
    };

    let report = encode_file(&ctx, &input, &video, &encoded, "pw").unwrap();
    assert!(report.redundancy >= 3, "redundancy {}", report.redundancy);

    let recovered = decode_file(&ctx, &encoded, &decoded, "pw", Some(&bits)).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), b"meet me by the pier");
    assert!(recovered.candidates >= 2);

    // One byte per demodulated symbol, each 0 or 1.
    let dump = fs::read(&bits).unwrap();
    assert_eq!(dump.len(), 2_400);
    assert!(dump.iter().all(|&b| b <= 1));
}

#[test]
fn wrong_password_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    let video = dir.path().join("clip.wav");
    let encoded = dir.path().join("out.wav");
    fs::write(&input, b"x").unwrap();
    carrier_video(&video, 8_000, 16.0);

    let ctx = RunContext {
        config: ModemConfig::for_sample_rate(8_000),
        cipher: &AesGcmSivCipher,
        transcoder: &WavPassthrough,
        keep_temp: false,
    };
    encode_file(&ctx, &input, &video, &encoded, "right").unwrap();
    let decoded = dir.path().join("o");
    let err = decode_file(&ctx, &encoded, &decoded, "wrong", None).unwrap_err();
    assert!(matches!(err, StegoError::DecryptionFailed));
}

#[test]
fn oversized_input_fails_before_remux() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("big.bin");
    let video = dir.path().join("clip.wav");
    let encoded = dir.path().join("out.wav");
    fs::write(&input, vec![7u8; 500]).unwrap();
    carrier_video(&video, 8_000, 5.0);

    let ctx = RunContext {
        config: ModemConfig::for_sample_rate(8_000),
        cipher: &AesGcmSivCipher,
        transcoder: &WavPassthrough,
        keep_temp: false,
    };
    let err = encode_file(&ctx, &input, &video, &encoded, "pw").unwrap_err();
    assert!(matches!(err, StegoError::CapacityExceeded { .. }));
    assert!(!encoded.exists());
}

#[test]
fn missing_input_is_a_permission_error() {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.wav");
    carrier_video(&video, 8_000, 1.0);

    let ctx = RunContext {
        config: ModemConfig::for_sample_rate(8_000),
        cipher: &AesGcmSivCipher,
        transcoder: &WavPassthrough,
        keep_temp: false,
    };
    let input = dir.path().join("nope.txt");
    let output = dir.path().join("o.wav");
    let err = encode_file(&ctx, &input, &video, &output, "pw").unwrap_err();
    assert!(matches!(err, StegoError::PermissionDenied { needs: "read", .. }));
}

#[test]
fn missing_tools_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = RunContext {
        config: ModemConfig::default(),
        cipher: &AesGcmSivCipher,
        transcoder: &MissingTools,
        keep_temp: false,
    };
    let video = dir.path().join("clip.mp4");
    let decoded = dir.path().join("o");
    let err = decode_file(&ctx, &video, &decoded, "pw", None).unwrap_err();
    assert!(matches!(
        err,
        StegoError::ExternalTool {
            stage: "dependency check",
            ..
        }
    ));
}

#[test]
fn bit_dump_survives_failed_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.wav");
    let bits = dir.path().join("bits.raw");
    let decoded = dir.path().join("secret.out");
    carrier_video(&video, 8_000, 8.0);

    let ctx = RunContext {
        config: ModemConfig::for_sample_rate(8_000),
        cipher: &AesGcmSivCipher,
        transcoder: &WavPassthrough,
        keep_temp: false,
    };
    let result = decode_file(&ctx, &video, &decoded, "pw", Some(&bits));
    assert!(matches!(result, Err(StegoError::IntegrityFailure { .. })));
    assert!(!decoded.exists());

    // Nothing was hidden, but every demodulated bit still reached the dump.
    let dump = fs::read(&bits).unwrap();
    assert!((780..=820).contains(&dump.len()), "{} bits", dump.len());
    assert!(dump.iter().all(|&b| b <= 1));
}
