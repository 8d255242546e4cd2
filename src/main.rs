// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

mod exit;
mod logging;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hushband::{
    decode_file, encode_file, AesGcmSivCipher, FfmpegTranscoder, ModemConfig, RunContext,
    StegoError,
};

use crate::logging::{init_logging, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "hushband",
    version,
    about = "Hide encrypted data inside video files using near-ultrasonic audio"
)]
struct Cli {
    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Where to write the result (default: next to the video container).
    #[arg(long, short = 'o', value_name = "PATH", global = true)]
    output: Option<PathBuf>,

    /// Keep the temporary working directory after the run.
    #[arg(long, global = true)]
    keep_temp: bool,

    #[command(flatten)]
    modem: ModemArgs,

    #[command(subcommand)]
    command: Command,
}

/// Modem parameters; encoder and decoder must use the same values.
#[derive(Args, Debug, Default)]
struct ModemArgs {
    /// Audio sample rate in Hz.
    #[arg(long, global = true)]
    sample_rate: Option<u32>,
    /// Hidden-channel bits per second.
    #[arg(long, global = true)]
    bit_rate: Option<u32>,
    /// Carrier frequency in Hz (default: 1 kHz below Nyquist).
    #[arg(long, global = true)]
    carrier_offset: Option<f64>,
    /// Phase advance per sample for a full-scale symbol, in radians.
    #[arg(long, global = true)]
    sensitivity: Option<f64>,
    /// Gaussian filter bandwidth-time product.
    #[arg(long, global = true)]
    bt: Option<f64>,
    /// Demodulator low-pass cutoff in Hz.
    #[arg(long, global = true)]
    cutoff: Option<f64>,
    /// Demodulator low-pass transition width in Hz.
    #[arg(long, global = true)]
    transition: Option<f64>,
}

impl ModemArgs {
    fn to_config(&self) -> ModemConfig {
        let base = ModemConfig::for_sample_rate(
            self.sample_rate.unwrap_or(hushband::stego::config::DEFAULT_SAMPLE_RATE),
        );
        ModemConfig {
            bit_rate: self.bit_rate.unwrap_or(base.bit_rate),
            carrier_offset: self.carrier_offset.unwrap_or(base.carrier_offset),
            sensitivity: self.sensitivity.unwrap_or(base.sensitivity),
            bt: self.bt.unwrap_or(base.bt),
            cutoff: self.cutoff.unwrap_or(base.cutoff),
            transition: self.transition.unwrap_or(base.transition),
            ..base
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide <input_file> inside the audio of <video_container>.
    Encode(EncodeArgs),
    /// Recover the data hidden in <video_container>.
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    input_file: PathBuf,
    video_container: PathBuf,
    password: String,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    video_container: PathBuf,
    password: String,
    /// Write every demodulated bit to this file as a 0x00/0x01 byte.
    #[arg(long, value_name = "PATH")]
    dump_bits: Option<PathBuf>,
}

fn print_info(message: &str) {
    println!("INFO:\n\t{message}");
}

fn print_success(message: &str) {
    println!("SUCCESS:\n\t{message}");
}

fn print_error(err: &StegoError) {
    eprintln!("ERROR:\n\t{err}");
    eprintln!("INFO:\n\t{}", err.hint());
}

/// `<dir>/<stem>_hushband.<extension>` next to `video`.
fn default_output(video: &Path, extension: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    video.with_file_name(format!("{stem}_hushband.{extension}"))
}

fn run(cli: Cli) -> Result<(), StegoError> {
    let config = cli.modem.to_config();
    config.validate()?;
    let transcoder = FfmpegTranscoder::new(config.sample_rate);
    let cipher = AesGcmSivCipher;
    let ctx = RunContext {
        config,
        cipher: &cipher,
        transcoder: &transcoder,
        keep_temp: cli.keep_temp,
    };

    match cli.command {
        Command::Encode(args) => {
            let extension = args
                .video_container
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "mp4".into());
            let output = cli
                .output
                .unwrap_or_else(|| default_output(&args.video_container, &extension));
            print_info("signal modulation has started, please wait ...");
            let report = encode_file(
                &ctx,
                &args.input_file,
                &args.video_container,
                &output,
                &args.password,
            )?;
            print_info(&format!(
                "the payload was hidden {} times ({} of {} channel bits used)",
                report.redundancy,
                report.redundancy * report.frame_bits,
                report.capacity_bits
            ));
            print_success(&format!(
                "the new video file containing the data in \"{}\" is located at \"{}\"",
                args.input_file.display(),
                output.display()
            ));
        }
        Command::Decode(args) => {
            let output = cli
                .output
                .unwrap_or_else(|| default_output(&args.video_container, "data"));
            print_info("signal demodulation has started, please wait ...");
            let recovered = decode_file(
                &ctx,
                &args.video_container,
                &output,
                &args.password,
                args.dump_bits.as_deref(),
            )?;
            print_info(&format!(
                "frame {} of {} passed the integrity check",
                recovered.candidate_index + 1,
                recovered.candidates
            ));
            print_success(&format!(
                "the retrieved hidden data from \"{}\" is located at \"{}\"",
                args.video_container.display(),
                output.display()
            ));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(()) => std::process::exit(exit::SUCCESS),
        Err(err) => {
            print_error(&err);
            std::process::exit(exit::code_for(&err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from(["hushband", "encode", "secret.txt", "clip.mp4", "pw"])
            .expect("encode args should parse");
        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.input_file, PathBuf::from("secret.txt"));
                assert_eq!(args.video_container, PathBuf::from("clip.mp4"));
                assert_eq!(args.password, "pw");
            }
            other => panic!("expected encode, got {other:?}"),
        }
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert!(!cli.keep_temp);
        assert_eq!(cli.modem.to_config(), ModemConfig::default());
    }

    #[test]
    fn parses_decode_with_options() {
        let cli = Cli::try_parse_from([
            "hushband",
            "decode",
            "clip.mp4",
            "pw",
            "--dump-bits",
            "bits.raw",
            "--keep-temp",
            "--sample-rate",
            "48000",
            "--bt",
            "0.5",
            "-o",
            "out.bin",
        ])
        .expect("decode args should parse");

        assert!(cli.keep_temp);
        assert_eq!(cli.output, Some(PathBuf::from("out.bin")));
        let config = cli.modem.to_config();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.carrier_offset, 23_000.0);
        assert_eq!(config.bt, 0.5);
        assert!(matches!(
            cli.command,
            Command::Decode(DecodeArgs {
                dump_bits: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn rejects_missing_password() {
        let err = Cli::try_parse_from(["hushband", "decode", "clip.mp4"])
            .expect_err("password is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["hushband", "hide", "a", "b"]).is_err());
    }

    #[test]
    fn explicit_carrier_overrides_default() {
        let modem = ModemArgs {
            carrier_offset: Some(19_000.0),
            ..ModemArgs::default()
        };
        assert_eq!(modem.to_config().carrier_offset, 19_000.0);
    }

    #[test]
    fn non_finite_modem_options_fail_validation() {
        for (flag, value) in [("--carrier-offset", "NaN"), ("--bt", "inf")] {
            let cli = Cli::try_parse_from(["hushband", "decode", "clip.mp4", "pw", flag, value])
                .expect("clap accepts any f64 literal");
            let err = cli.modem.to_config().validate().unwrap_err();
            assert_eq!(exit::code_for(&err), exit::USAGE, "{flag} {value}");
        }
    }

    #[test]
    fn default_output_sits_next_to_the_video() {
        assert_eq!(
            default_output(Path::new("/videos/clip.mkv"), "mkv"),
            PathBuf::from("/videos/clip_hushband.mkv")
        );
        assert_eq!(
            default_output(Path::new("clip.mp4"), "data"),
            PathBuf::from("clip_hushband.data")
        );
    }

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            StegoError::CapacityExceeded {
                frame_bits: 1,
                capacity_bits: 0,
            },
            StegoError::IntegrityFailure { candidates: 0 },
            StegoError::ExternalTool {
                stage: "remux",
                detail: String::new(),
            },
            StegoError::PermissionDenied {
                path: PathBuf::new(),
                needs: "read",
            },
            StegoError::DecryptionFailed,
            StegoError::UnsupportedAudio(String::new()),
            StegoError::InvalidConfig(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(exit::code_for).collect();
        assert!(codes.iter().all(|&c| c != exit::SUCCESS));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
