// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the hiding and recovery pipeline.
//!
//! [`StegoError`] covers every failure mode from argument checks and external
//! tool invocation through modulation and frame recovery. Each variant names
//! the stage that failed; [`StegoError::hint`] gives the operator a
//! remediation.

use core::fmt;
use std::path::PathBuf;

/// Errors that can occur while hiding or recovering a payload.
#[derive(Debug)]
pub enum StegoError {
    /// The framed payload does not fit into the carrier even once.
    CapacityExceeded {
        /// Bits needed for one frame (sync + body + checksum).
        frame_bits: usize,
        /// Bits the carrier audio can hold.
        capacity_bits: usize,
    },
    /// No tiled frame survived the channel with a matching checksum.
    IntegrityFailure {
        /// Number of candidate segments that were examined.
        candidates: usize,
    },
    /// An external transcoding tool was missing or exited with failure.
    ExternalTool {
        /// Stage that invoked the tool (e.g. "audio extraction").
        stage: &'static str,
        /// Exit status or spawn error.
        detail: String,
    },
    /// An input path lacks the access the run needs.
    PermissionDenied {
        path: PathBuf,
        /// Human readable access requirement ("read", "read and write").
        needs: &'static str,
    },
    /// Payload decryption failed (wrong password or corrupted ciphertext).
    DecryptionFailed,
    /// The carrier audio is not mono 16-bit PCM, or is otherwise unusable.
    UnsupportedAudio(String),
    /// The modem configuration is inconsistent.
    InvalidConfig(String),
    /// Two adjacent pipeline stages disagree on the buffer shape.
    PipelineMismatch {
        upstream: &'static str,
        downstream: &'static str,
    },
    /// A stage received a buffer of the wrong shape at run time.
    UnexpectedBuffer {
        stage: &'static str,
    },
    /// Filesystem failure while handling run artifacts.
    Io {
        stage: &'static str,
        source: std::io::Error,
    },
    /// WAV encoding or decoding failed.
    Wav(hound::Error),
}

impl StegoError {
    /// Remediation hint shown to the operator alongside the error.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => {
                "try again using a longer video or a smaller input file"
            }
            Self::IntegrityFailure { .. } => {
                "the video was probably re-encoded, compressed or distorted; \
                 encoding with a longer video or a smaller input file adds redundancy"
            }
            Self::ExternalTool { .. } => {
                "make sure ffmpeg and lame are installed and the video has an audio track \
                 (Debian-like distros: sudo apt install ffmpeg lame)"
            }
            Self::PermissionDenied { .. } => {
                "encoding needs read access to <input_file> and read/write access to \
                 <video_container>; decoding needs read access to <video_container>"
            }
            Self::DecryptionFailed => "check the password used when encoding",
            Self::UnsupportedAudio(_) => "the carrier audio must be mono 16-bit PCM",
            Self::InvalidConfig(_) => {
                "encoder and decoder must use the same valid modem parameters"
            }
            Self::PipelineMismatch { .. } | Self::UnexpectedBuffer { .. } => {
                "this is a bug in the stage graph, please report it"
            }
            Self::Io { .. } => "check free space and permissions of the temporary directory",
            Self::Wav(_) => "the intermediate WAV file is unreadable, try a different video",
        }
    }
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                frame_bits,
                capacity_bits,
            } => write!(
                f,
                "capacity planning: frame needs {frame_bits} bits \
                 but the carrier holds {capacity_bits}"
            ),
            Self::IntegrityFailure { candidates } => write!(
                f,
                "frame recovery: none of {candidates} candidate frames passed the integrity check"
            ),
            Self::ExternalTool { stage, detail } => write!(f, "{stage}: {detail}"),
            Self::PermissionDenied { path, needs } => {
                write!(
                    f,
                    "permission check: {needs} access required for {}",
                    path.display()
                )
            }
            Self::DecryptionFailed => write!(f, "decryption failed (wrong password?)"),
            Self::UnsupportedAudio(reason) => write!(f, "audio input: {reason}"),
            Self::InvalidConfig(reason) => write!(f, "configuration: {reason}"),
            Self::PipelineMismatch {
                upstream,
                downstream,
            } => write!(
                f,
                "pipeline construction: {upstream} output does not match {downstream} input"
            ),
            Self::UnexpectedBuffer { stage } => {
                write!(f, "{stage}: received a buffer of the wrong shape")
            }
            Self::Io { stage, source } => write!(f, "{stage}: {source}"),
            Self::Wav(e) => write!(f, "wav: {e}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Wav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for StegoError {
    fn from(e: hound::Error) -> Self {
        Self::Wav(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stage() {
        let e = StegoError::CapacityExceeded {
            frame_bits: 160,
            capacity_bits: 100,
        };
        assert_eq!(
            e.to_string(),
            "capacity planning: frame needs 160 bits but the carrier holds 100"
        );

        let e = StegoError::ExternalTool {
            stage: "audio extraction",
            detail: "exit status: 1".into(),
        };
        assert!(e.to_string().starts_with("audio extraction:"));
    }

    #[test]
    fn io_source_is_exposed() {
        use std::error::Error;
        let e = StegoError::Io {
            stage: "workspace",
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
        assert!(StegoError::DecryptionFailed.source().is_none());
    }

    #[test]
    fn every_variant_has_a_hint() {
        let errors = [
            StegoError::IntegrityFailure { candidates: 3 },
            StegoError::DecryptionFailed,
            StegoError::UnsupportedAudio("stereo".into()),
            StegoError::InvalidConfig("bt".into()),
        ];
        for e in errors {
            assert!(!e.hint().is_empty(), "{e:?} has no hint");
        }
    }
}
