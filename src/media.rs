// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Video container handling around the audio pipeline.
//!
//! Audio is pulled out of the container as mono 16-bit PCM, processed, and
//! muxed back in as a high-bitrate MP3 encoded without the encoder's
//! low-pass, so the near-ultrasonic sub-band survives. The external tools
//! sit behind [`Transcoder`]; [`FfmpegTranscoder`] drives `ffmpeg` and
//! `lame`.
//!
//! Intermediate files live in a per-run [`Workspace`], a fresh temporary
//! directory that is deleted when the run ends.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::audio::{read_wav, write_wav};
use crate::stego::capacity::CapacityReport;
use crate::stego::config::ModemConfig;
use crate::stego::crypto::Cipher;
use crate::stego::error::StegoError;
use crate::stego::recovery::Recovered;
use crate::stego::{hide, reveal_with_tap};

/// Audio extraction and remuxing for one container format.
pub trait Transcoder {
    /// Make sure every external tool is installed.
    fn check_available(&self) -> Result<(), StegoError>;

    /// Write the container's audio track to `wav` as mono 16-bit PCM.
    fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), StegoError>;

    /// Write a copy of `video` whose audio track is replaced by `wav`.
    fn replace_audio(&self, video: &Path, wav: &Path, output: &Path) -> Result<(), StegoError>;
}

/// [`Transcoder`] backed by the `ffmpeg` and `lame` command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    sample_rate: u32,
    ffmpeg: OsString,
    lame: OsString,
}

impl FfmpegTranscoder {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_programs(sample_rate, "ffmpeg", "lame")
    }

    /// Use explicit program names or paths for the tools.
    pub fn with_programs(
        sample_rate: u32,
        ffmpeg: impl Into<OsString>,
        lame: impl Into<OsString>,
    ) -> Self {
        Self {
            sample_rate,
            ffmpeg: ffmpeg.into(),
            lame: lame.into(),
        }
    }
}

/// Run a tool to completion with its output discarded.
fn run_tool(stage: &'static str, cmd: &mut Command) -> Result<(), StegoError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(stage, command = ?cmd, "running external tool");
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| StegoError::ExternalTool {
            stage,
            detail: format!("could not run {program}: {e}"),
        })?;
    if !status.success() {
        return Err(StegoError::ExternalTool {
            stage,
            detail: format!("{program} failed ({status})"),
        });
    }
    Ok(())
}

impl Transcoder for FfmpegTranscoder {
    fn check_available(&self) -> Result<(), StegoError> {
        run_tool(
            "dependency check",
            Command::new(&self.ffmpeg).arg("-version"),
        )?;
        run_tool("dependency check", Command::new(&self.lame).arg("--help"))
    }

    fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), StegoError> {
        run_tool(
            "audio extraction",
            Command::new(&self.ffmpeg)
                .arg("-y")
                .arg("-i")
                .arg(video)
                .args(["-vn", "-acodec", "pcm_s16le", "-ar"])
                .arg(self.sample_rate.to_string())
                .args(["-ac", "1"])
                .arg(wav),
        )
    }

    fn replace_audio(&self, video: &Path, wav: &Path, output: &Path) -> Result<(), StegoError> {
        let mp3 = wav.with_extension("mp3");
        run_tool(
            "mp3 encoding",
            Command::new(&self.lame)
                .arg(wav)
                .args(["--preset", "insane", "--lowpass", "-1"])
                .arg(&mp3),
        )?;
        run_tool(
            "remux",
            Command::new(&self.ffmpeg)
                .arg("-y")
                .arg("-i")
                .arg(video)
                .arg("-i")
                .arg(&mp3)
                .args([
                    "-map", "0:v", "-map", "1:a", "-c:v", "copy", "-c:a", "copy",
                ])
                .arg(output),
        )
    }
}

/// Per-run scratch directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh directory under the system temp dir. With `keep` set
    /// the directory outlives the run.
    pub fn create(keep: bool) -> Result<Self, StegoError> {
        let dir = tempfile::Builder::new()
            .prefix("hushband-")
            .disable_cleanup(keep)
            .tempdir()
            .map_err(|source| StegoError::Io {
                stage: "workspace",
                source,
            })?;
        if keep {
            info!(path = %dir.path().display(), "keeping intermediate files");
        }
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Fail unless `path` can be opened for reading.
pub fn check_readable(path: &Path) -> Result<(), StegoError> {
    File::open(path)
        .map(drop)
        .map_err(|_| StegoError::PermissionDenied {
            path: path.to_path_buf(),
            needs: "read",
        })
}

/// Fail unless `path` exists and can be opened for reading and writing.
pub fn check_read_write(path: &Path) -> Result<(), StegoError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map(drop)
        .map_err(|_| StegoError::PermissionDenied {
            path: path.to_path_buf(),
            needs: "read and write",
        })
}

/// Everything a file-level run needs besides its paths.
pub struct RunContext<'a> {
    pub config: ModemConfig,
    pub cipher: &'a dyn Cipher,
    pub transcoder: &'a dyn Transcoder,
    /// Keep the workspace after the run.
    pub keep_temp: bool,
}

/// Encrypt `input` and hide it in the audio of `video`, writing the result
/// to `output`.
pub fn encode_file(
    ctx: &RunContext<'_>,
    input: &Path,
    video: &Path,
    output: &Path,
    password: &str,
) -> Result<CapacityReport, StegoError> {
    ctx.config.validate()?;
    ctx.transcoder.check_available()?;
    check_readable(input)?;
    check_read_write(video)?;

    let workspace = Workspace::create(ctx.keep_temp)?;
    let extracted = workspace.file("extracted.wav");
    ctx.transcoder.extract_audio(video, &extracted)?;
    let original = read_wav(&extracted)?;

    let plaintext = fs::read(input).map_err(|source| StegoError::Io {
        stage: "input file",
        source,
    })?;
    let blob = ctx.cipher.encrypt(&plaintext, password);
    debug!(
        plaintext = plaintext.len(),
        ciphertext = blob.len(),
        "payload encrypted"
    );

    let (mixed, report) = hide(&original, &blob, &ctx.config)?;
    let modified = workspace.file("modified.wav");
    write_wav(&modified, &mixed)?;
    ctx.transcoder.replace_audio(video, &modified, output)?;
    Ok(report)
}

/// Recover and decrypt the payload hidden in `video`, writing it to
/// `output`. When `dump_bits` is set every demodulated bit is also written
/// there as a `0x00`/`0x01` byte.
pub fn decode_file(
    ctx: &RunContext<'_>,
    video: &Path,
    output: &Path,
    password: &str,
    dump_bits: Option<&Path>,
) -> Result<Recovered, StegoError> {
    ctx.config.validate()?;
    ctx.transcoder.check_available()?;
    check_readable(video)?;

    let workspace = Workspace::create(ctx.keep_temp)?;
    let extracted = workspace.file("extracted.wav");
    ctx.transcoder.extract_audio(video, &extracted)?;
    let captured = read_wav(&extracted)?;

    let tap = match dump_bits {
        Some(path) => {
            let file = File::create(path).map_err(|source| StegoError::Io {
                stage: "bit dump",
                source,
            })?;
            Some(Box::new(file) as Box<dyn Write>)
        }
        None => None,
    };
    let recovered = reveal_with_tap(&captured, &ctx.config, tap)?;
    let plaintext = ctx.cipher.decrypt(recovered.body(), password)?;
    fs::write(output, &plaintext).map_err(|source| StegoError::Io {
        stage: "output file",
        source,
    })?;
    Ok(recovered)
}
