// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LUMEN Wallet — Core Library
//!
//! The engine room of the LUMEN mobile wallet. The screens, themes, and
//! navigation live in the app shell; everything that has to be *correct*
//! lives here.
//!
//! The star of this crate is the **airgap remote-signing subsystem**: a
//! protocol for getting a transaction signed by a device with no network
//! and no cable, over nothing but QR codes and a camera. It sounds like a
//! parlor trick until you need to prove that a hardware signer in a
//! drawer actually controls an account — without broadcasting anything,
//! without connectivity, without trusting the signer's word for it.
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 keys and the hash functions. Don't roll your own.
//! - **ledger** — Addresses, transaction construction, and the signed-
//!   transaction wire codec. The wallet's contract with the chain.
//! - **airgap** — Frame codec, envelope protocol, response validation,
//!   offline signature verification, and the flow state machine.
//! - **config** — Every constant, in one place, with its reasoning.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over convenience. Money doesn't forgive.
//! 2. Everything scanned off a camera is hostile until proven otherwise.
//! 3. Verification works in a basement with airplane mode on.
//! 4. If it touches signatures, it has tests. Plural.

pub mod airgap;
pub mod config;
pub mod crypto;
pub mod ledger;
