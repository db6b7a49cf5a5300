//! # Airgap Remote Signing
//!
//! Obtains a cryptographic signature from a device that has no network
//! connection and no cable, using only a camera and a screen. The wallet
//! displays a request as a (possibly animated) sequence of QR frames; the
//! signer device scans them, signs, and displays its response the same
//! way; the wallet scans that back and verifies everything locally.
//!
//! ## The pipeline
//!
//! ```text
//!   frame.rs     — split a payload into QR frames / reassemble from scans
//!   envelope.rs  — the request/response message shapes on that transport
//!   validate.rs  — does this response answer *our* request, exactly once?
//!   verify.rs    — is the signature real, and is the signer who we asked?
//!   flow.rs      — the state machine that drives one verification attempt
//! ```
//!
//! Each layer trusts strictly less than the one below it. The frame codec
//! trusts nothing (cameras read menus); the envelope layer trusts frames
//! reassembled but not content; the validator trusts shape but not
//! identity; the verifier trusts identity claims only after the math
//! agrees. The flow controller owns the ordering and turns any failure
//! into one typed terminal outcome.
//!
//! ## Security invariants
//!
//! - A response must echo the live request's id, or it is rejected before
//!   anything reads its contents.
//! - A response must contain **exactly one** signed transaction. Not
//!   zero, not two. A variable-length batch answering a single-transaction
//!   request is how a compromised signer smuggles in an unapproved
//!   transaction, so the count check runs before any content inspection.
//! - Signature verification is fully offline. Nothing in this module can
//!   reach a network even if it wanted to.

pub mod envelope;
pub mod flow;
pub mod frame;
pub mod validate;
pub mod verify;

pub use envelope::{Envelope, EnvelopeError, ResponseError, SigningRequest, SigningResponse};
pub use flow::{
    AirgapService, BuilderError, FlowError, FlowOutcome, FlowSession, FlowState,
    LocalProofTxnBuilder, ProofTxnBuilder,
};
pub use frame::{
    encode_payload, DecodeOutcome, FrameError, FrameSet, QrFrame, ReassemblyBuffer,
};
pub use validate::{validate_response, ValidationError};
pub use verify::{verify_signed_transaction, VerificationReport, VerifyError};
