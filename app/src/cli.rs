//! # CLI Interface
//!
//! Defines the command-line argument structure for `lumen-app` using
//! `clap` derive. Supports three subcommands: `demo`, `encode`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LUMEN wallet demo & diagnostic CLI.
///
/// Drives the wallet's airgap remote-signing subsystem from a terminal:
/// run a full loopback verification flow against a simulated signer, or
/// encode arbitrary payloads into QR frame lines for inspection.
#[derive(Parser, Debug)]
#[command(
    name = "lumen-app",
    about = "LUMEN wallet airgap demo CLI",
    version,
    propagate_version = true
)]
pub struct LumenAppCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "LUMEN_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,
}

/// Top-level subcommands for the LUMEN app binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full airgap verification flow against an in-process
    /// simulated signer, printing every state transition.
    Demo(DemoArgs),
    /// Encode a payload file into QR frame text lines on stdout.
    Encode(EncodeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Frame capacity in payload bytes per QR frame.
    #[arg(long, default_value_t = lumen_wallet::config::DEFAULT_FRAME_CAPACITY)]
    pub frame_capacity: usize,

    /// Make the simulated signer decline the request, to exercise the
    /// rejection path instead of the success path.
    #[arg(long)]
    pub decline: bool,

    /// Make the simulated signer use a key that does not match the
    /// target address, to exercise the signer-mismatch path.
    #[arg(long, conflicts_with = "decline")]
    pub wrong_key: bool,

    /// Print every QR frame line as it would be displayed.
    #[arg(long)]
    pub show_frames: bool,
}

/// Arguments for the `encode` subcommand.
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Path to the payload file to encode.
    pub input: PathBuf,

    /// Frame capacity in payload bytes per QR frame.
    #[arg(long, default_value_t = lumen_wallet::config::DEFAULT_FRAME_CAPACITY)]
    pub frame_capacity: usize,
}
