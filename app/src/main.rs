// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LUMEN App CLI
//!
//! Entry point for the `lumen-app` binary. Parses CLI arguments,
//! initializes logging, and drives the wallet's airgap subsystem from a
//! terminal — a loopback stand-in for the mobile shell, and a handy way
//! to eyeball frame output without two phones on your desk.
//!
//! The binary supports three subcommands:
//!
//! - `demo`    — run a full verification flow against a simulated signer
//! - `encode`  — encode a payload file into QR frame lines
//! - `version` — print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lumen_wallet::airgap::envelope::{Envelope, SigningResponse};
use lumen_wallet::airgap::flow::{AirgapService, FlowOutcome, FlowState, LocalProofTxnBuilder};
use lumen_wallet::airgap::frame::{encode_payload, DecodeOutcome, ReassemblyBuffer};
use lumen_wallet::crypto::keys::LumenKeypair;
use lumen_wallet::ledger::address::LumenAddress;
use lumen_wallet::ledger::signing::{decode_txn, encode_txn, sign_transaction};

use cli::{Commands, DemoArgs, EncodeArgs, LumenAppCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LumenAppCli::parse();
    logging::init_logging(
        "lumen_app=info,lumen_wallet=debug",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Demo(args) => run_demo(args).await,
        Commands::Encode(args) => run_encode(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs one full wallet↔signer loopback on this machine.
///
/// The "airgap signer" here is a keypair and a few function calls in the
/// same process — the protocol neither knows nor cares, which is rather
/// the point of verifying everything from bytes alone.
async fn run_demo(args: DemoArgs) -> Result<()> {
    // The device key whose control we are going to prove.
    let signer_key = LumenKeypair::generate();
    let target = LumenAddress::from_public_key(&signer_key.public_key());
    tracing::info!(address = %target, "generated simulated signer identity");

    let service =
        AirgapService::with_frame_capacity(Arc::new(LocalProofTxnBuilder), args.frame_capacity);

    // Building → DisplayingQr.
    let mut session = service.start_flow(&target).await;
    tracing::info!(state = ?session.state(), "flow started");
    if session.state() != FlowState::DisplayingQr {
        report_outcome(&session);
        bail!("flow did not reach DisplayingQr");
    }

    let frames = session.frames().context("frames missing in DisplayingQr")?;
    tracing::info!(
        frames = frames.frames.len(),
        animated = frames.is_animated,
        rate_hz = frames.frame_rate_hz,
        "request ready for display"
    );
    if args.show_frames {
        for line in frames.texts() {
            println!("{line}");
        }
    }

    // The signer side: scan, sign (or decline), respond.
    let reply = simulate_signer(&frames.texts(), &signer_key, &args)?;

    // ScanningResponse → Verifying → terminal.
    session.begin_scanning();
    tracing::info!(state = ?session.state(), "scanning signer response");
    for line in &reply {
        session.on_scan(line);
    }

    report_outcome(&session);
    Ok(())
}

/// Plays the airgap signer against the wallet's displayed frames.
fn simulate_signer(
    frame_texts: &[String],
    signer_key: &LumenKeypair,
    args: &DemoArgs,
) -> Result<Vec<String>> {
    let mut buf = ReassemblyBuffer::new();
    let mut payload = None;
    for text in frame_texts {
        if let DecodeOutcome::Complete(p) = buf.accept_text(text)? {
            payload = Some(p);
        }
    }
    let payload = payload.context("request frames did not reassemble")?;

    let Envelope::Request(request) = Envelope::decode(&payload)? else {
        bail!("signer expected a request envelope");
    };
    tracing::info!(request_id = %request.request_id, "signer received request");

    let response = if args.decline {
        tracing::info!("signer declining request");
        SigningResponse::rejected(&request.request_id, "declined", "User declined")
    } else {
        let imposter;
        let key = if args.wrong_key {
            tracing::info!("signer using a non-matching key");
            imposter = LumenKeypair::generate();
            &imposter
        } else {
            signer_key
        };
        let mut tx = decode_txn(&request.unsigned_txn)?;
        sign_transaction(&mut tx, key);
        SigningResponse::approved(&request.request_id, vec![encode_txn(&tx)?])
    };

    let bytes = Envelope::Response(response).encode()?;
    Ok(encode_payload(&bytes, args.frame_capacity)?.texts())
}

/// Prints the terminal outcome of a flow in human terms.
fn report_outcome(session: &lumen_wallet::airgap::flow::FlowSession) {
    match session.outcome() {
        Some(FlowOutcome::Verified { signer_address }) => {
            tracing::info!(signer = %signer_address, "verification SUCCEEDED");
            println!("verified: {signer_address}");
        }
        Some(FlowOutcome::Failed { error }) => {
            tracing::warn!(%error, "verification FAILED");
            println!("failed: {error}");
        }
        Some(FlowOutcome::Cancelled) => {
            tracing::info!("flow cancelled");
            println!("cancelled");
        }
        None => {
            tracing::warn!(state = ?session.state(), "flow ended without outcome");
            println!("incomplete: {:?}", session.state());
        }
    }
}

/// Encodes a payload file into QR frame lines on stdout.
fn run_encode(args: EncodeArgs) -> Result<()> {
    let payload = std::fs::read(&args.input)
        .with_context(|| format!("failed to read payload file {}", args.input.display()))?;

    let set = encode_payload(&payload, args.frame_capacity)?;
    tracing::info!(
        bytes = payload.len(),
        frames = set.frames.len(),
        animated = set.is_animated,
        "payload encoded"
    );

    for line in set.texts() {
        println!("{line}");
    }
    Ok(())
}

fn print_version() {
    println!(
        "lumen-app {} (wallet {})",
        env!("CARGO_PKG_VERSION"),
        lumen_wallet::config::WALLET_VERSION,
    );
}
