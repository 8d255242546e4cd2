// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # hushband
//!
//! Hides an encrypted payload in the audio track of a video. The payload is
//! framed with a sync pattern and an MD5 digest, repeated as often as the
//! audio allows, GFSK-modulated onto a carrier 1 kHz below Nyquist
//! (21.05 kHz at 44.1 kHz) and mixed into the original waveform. Decoding
//! shifts that sub-band back to baseband, demodulates it, and accepts the
//! first repetition whose digest matches.
//!
//! - [`stego`]: framing, capacity planning, encryption, `hide` / `reveal`
//! - [`dsp`]: the modulator and demodulator stages and their graphs
//! - [`audio`]: mono 16-bit WAV I/O
//! - [`media`]: `ffmpeg`/`lame` orchestration and file-level runs
//!
//! # Quick start
//!
//! ```rust,ignore
//! use hushband::{hide, reveal, ModemConfig, PcmAudio};
//!
//! let config = ModemConfig::default();
//! let original = PcmAudio::new(44_100, samples);
//! let (mixed, report) = hide(&original, b"ciphertext", &config).unwrap();
//! let recovered = reveal(&mixed, &config).unwrap();
//! assert_eq!(recovered.body(), b"ciphertext");
//! ```

pub mod audio;
pub mod dsp;
pub mod media;
pub mod stego;

pub use audio::{read_wav, write_wav, PcmAudio};
pub use media::{decode_file, encode_file, FfmpegTranscoder, RunContext, Transcoder, Workspace};
pub use stego::{
    hide, plan, reveal, reveal_with_tap, AesGcmSivCipher, CapacityReport, Cipher, ModemConfig,
    Recovered, StegoError,
};
