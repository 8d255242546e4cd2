// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

use hushband::StegoError;

pub const SUCCESS: i32 = 0;
pub const EXTERNAL_TOOL: i32 = 3;
pub const CAPACITY_EXCEEDED: i32 = 20;
pub const PERMISSION_DENIED: i32 = 50;
pub const INTEGRITY_FAILURE: i32 = 60;
pub const DECRYPTION_FAILED: i32 = 61;
pub const UNSUPPORTED_AUDIO: i32 = 62;
pub const USAGE: i32 = 64;
pub const IO_ERROR: i32 = 74;
pub const INTERNAL: i32 = 125;

/// Process exit code for a failed run.
pub fn code_for(err: &StegoError) -> i32 {
    match err {
        StegoError::CapacityExceeded { .. } => CAPACITY_EXCEEDED,
        StegoError::IntegrityFailure { .. } => INTEGRITY_FAILURE,
        StegoError::ExternalTool { .. } => EXTERNAL_TOOL,
        StegoError::PermissionDenied { .. } => PERMISSION_DENIED,
        StegoError::DecryptionFailed => DECRYPTION_FAILED,
        StegoError::UnsupportedAudio(_) | StegoError::Wav(_) => UNSUPPORTED_AUDIO,
        StegoError::InvalidConfig(_) => USAGE,
        StegoError::Io { .. } => IO_ERROR,
        StegoError::PipelineMismatch { .. } | StegoError::UnexpectedBuffer { .. } => INTERNAL,
    }
}
