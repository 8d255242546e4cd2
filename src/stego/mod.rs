// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload framing, capacity planning and the hide/reveal pipelines.
//!
//! A payload (normally ciphertext from [`crypto`]) is wrapped in a frame
//! carrying a sync pattern and an MD5 digest, tiled as often as the carrier
//! audio allows, and modulated into the near-ultrasonic sub-band. Recovery
//! splits the demodulated bits on the sync pattern and accepts the first
//! repetition whose digest matches.

pub mod bits;
pub mod capacity;
pub mod config;
pub mod crypto;
pub mod error;
pub mod frame;
mod pipeline;
pub mod recovery;

pub use capacity::{plan, CapacityReport};
pub use config::ModemConfig;
pub use crypto::{AesGcmSivCipher, Cipher};
pub use error::StegoError;
pub use frame::{build_frame, Frame};
pub use pipeline::{hide, reveal, reveal_with_tap};
pub use recovery::Recovered;
