//! # Verification Flow Controller
//!
//! The state machine that sequences an airgap verification from start to
//! verdict:
//!
//! ```text
//! Building ──► DisplayingQr ◄──► ScanningResponse ──► Verifying ──► Success
//!    │               │                  │                 │
//!    └───────────────┴──────────────────┴─────────────────┴───────► Failed
//!                            (cancel from anywhere) ──────────────► Cancelled
//! ```
//!
//! Asynchronous events — camera scans, user cancellation, re-display —
//! arrive as discrete method calls, consumed one at a time and gated by a
//! state check before they are applied. There are no free-running
//! callbacks that can fire into a session that already ended; a scan
//! delivered outside `ScanningResponse` is ignored, full stop. That gate
//! is what kills the whole class of "late callback mutates a superseded
//! session" bugs.
//!
//! Sessions come from an [`AirgapService`]: an explicitly constructed,
//! dependency-injected factory with no ambient global state. The service
//! also enforces the one-live-flow-per-target rule — starting a new flow
//! for an address supersedes the old session, which notices on its next
//! event and self-cancels instead of limping on with a dead request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config;
use crate::ledger::address::LumenAddress;
use crate::ledger::signing::encode_txn;
use crate::ledger::transaction::TransactionBuilder;

use super::envelope::{Envelope, EnvelopeError, SigningRequest};
use super::frame::{encode_payload, DecodeOutcome, FrameError, FrameSet, ReassemblyBuffer};
use super::validate::{validate_response, ValidationError};
use super::verify::{verify_signed_transaction, VerifyError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Boxed error the transaction-builder collaborator is allowed to fail with.
pub type BuilderError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can take a flow to `Failed`.
///
/// One enum at the flow level so the caller gets a single typed outcome;
/// the component-level errors convert in via `#[from]` and keep their
/// specific messages.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The transaction-builder collaborator failed.
    #[error("transaction builder failed: {0}")]
    BuilderFailure(String),

    /// The camera collaborator reported a failure (permission denied,
    /// hardware gone). Distinct from scan *content*, which is never an
    /// error at this level.
    #[error("scanner failure: {0}")]
    ScanError(String),

    /// Frame encoding rejected the request payload.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Envelope construction or decoding failed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The scanned payload decoded as a valid envelope, but not a
    /// response — most likely the signer's own request scanned back, or
    /// a foreign LUMEN QR code.
    #[error("scanned payload is not a signing response")]
    NotAResponse,

    /// The response failed validation against the outstanding request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Offline signature verification failed.
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// The external transaction-builder collaborator.
///
/// Building may suspend — a production implementation looks up account
/// parameters from wallet storage or a connected node — so the seam is
/// async. The flow only ever asks for one thing: an unsigned
/// proof-of-control transaction for the target, in the ledger's wire
/// encoding.
#[async_trait]
pub trait ProofTxnBuilder: Send + Sync {
    /// Builds the zero-value, self-addressed verification transaction.
    async fn build_verification_txn(&self, target: &LumenAddress)
        -> Result<Vec<u8>, BuilderError>;
}

/// The in-wallet default builder: constructs the proof-of-control
/// transaction locally from the ledger module, no lookups needed.
///
/// The nonce is fixed at 1 — a proof-of-control transaction is never
/// broadcast, so sequence numbers against chain state are meaningless
/// here; what matters is that the bytes are well-formed and signable.
#[derive(Debug, Default)]
pub struct LocalProofTxnBuilder;

#[async_trait]
impl ProofTxnBuilder for LocalProofTxnBuilder {
    async fn build_verification_txn(
        &self,
        target: &LumenAddress,
    ) -> Result<Vec<u8>, BuilderError> {
        let tx = TransactionBuilder::proof_of_control(target).nonce(1).build();
        Ok(encode_txn(&tx)?)
    }
}

// ---------------------------------------------------------------------------
// States & outcomes
// ---------------------------------------------------------------------------

/// Where a flow session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Asking the builder collaborator for the unsigned transaction.
    Building,
    /// Frames are ready; the UI is cycling them on screen.
    DisplayingQr,
    /// Consuming scan events, feeding the reassembly buffer.
    ScanningResponse,
    /// A full payload arrived; running decode → validate → verify.
    Verifying,
    /// Terminal: the signer provably controls the target key.
    Success,
    /// Terminal: something went wrong. Retry is available.
    Failed,
    /// Terminal: the user backed out, or a newer flow superseded this one.
    /// Deliberately distinct from `Failed` so callers don't show alarming
    /// copy when nothing actually went wrong.
    Cancelled,
}

impl FlowState {
    /// `true` for the three states no event can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

/// The single terminal result of a session.
#[derive(Debug)]
pub enum FlowOutcome {
    /// Verification succeeded; this address's key is provably controlled
    /// by the signer device.
    Verified {
        /// The verified signer address.
        signer_address: String,
    },
    /// Verification failed with a specific, reportable reason.
    Failed {
        /// What went wrong.
        error: FlowError,
    },
    /// The user cancelled, or a newer flow took over.
    Cancelled,
}

// ---------------------------------------------------------------------------
// AirgapService
// ---------------------------------------------------------------------------

/// Generation table: target address → the generation of its live session.
type GenerationTable = Arc<Mutex<HashMap<String, u64>>>;

/// Session factory and per-target arbiter.
///
/// Construct one per wallet instance and inject it where flows start —
/// there is intentionally no global. Two services know nothing about
/// each other, which is exactly the isolation the reassembly buffers
/// and request envelopes need.
pub struct AirgapService {
    builder: Arc<dyn ProofTxnBuilder>,
    frame_capacity: usize,
    generations: GenerationTable,
}

impl AirgapService {
    /// Creates a service with the default frame capacity.
    pub fn new(builder: Arc<dyn ProofTxnBuilder>) -> Self {
        Self::with_frame_capacity(builder, config::DEFAULT_FRAME_CAPACITY)
    }

    /// Creates a service with an explicit frame capacity (bytes of payload
    /// per QR frame, pre-armor).
    pub fn with_frame_capacity(builder: Arc<dyn ProofTxnBuilder>, frame_capacity: usize) -> Self {
        Self {
            builder,
            frame_capacity,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a verification flow for `target`.
    ///
    /// Any session previously started for the same target through this
    /// service is superseded: it will observe the stale generation on its
    /// next event and cancel itself.
    pub async fn start_flow(&self, target: &LumenAddress) -> FlowSession {
        FlowSession::start(
            Arc::clone(&self.builder),
            self.frame_capacity,
            Arc::clone(&self.generations),
            target.clone(),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// FlowSession
// ---------------------------------------------------------------------------

/// One live verification attempt. Exactly one terminal outcome, ever.
///
/// The session owns the request envelope, the encoded frames, and the
/// reassembly buffer for its lifetime. A retry does not reuse any of
/// them — it builds a new session with a fresh `request_id`, so a
/// response to the failed attempt can never be mistaken for a response
/// to the new one.
pub struct FlowSession {
    state: FlowState,
    target: LumenAddress,
    request: Option<SigningRequest>,
    frames: Option<FrameSet>,
    buffer: ReassemblyBuffer,
    outcome: Option<FlowOutcome>,
    /// Corrupt frames seen this session — diagnostic only.
    corrupt_frames: u32,
    /// This session's generation in the service's per-target table.
    generation: u64,
    generations: GenerationTable,
    builder: Arc<dyn ProofTxnBuilder>,
    frame_capacity: usize,
}

impl FlowSession {
    /// Builds the request and encodes its frames: the `Building` state.
    ///
    /// Returns a session in `DisplayingQr` on success, or already in
    /// `Failed` if the builder, the envelope layer, or the frame codec
    /// refused — callers always get a session back, never an error, so
    /// retry/cancel work uniformly.
    async fn start(
        builder: Arc<dyn ProofTxnBuilder>,
        frame_capacity: usize,
        generations: GenerationTable,
        target: LumenAddress,
    ) -> Self {
        // Registering a new generation supersedes any live session for
        // this target before we do anything else.
        let generation = {
            let mut table = generations.lock();
            let entry = table.entry(target.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let mut session = Self {
            state: FlowState::Building,
            target,
            request: None,
            frames: None,
            buffer: ReassemblyBuffer::new(),
            outcome: None,
            corrupt_frames: 0,
            generation,
            generations,
            builder,
            frame_capacity,
        };

        info!(address = %session.target, generation, "starting airgap verification flow");

        let unsigned = match session
            .builder
            .build_verification_txn(&session.target)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                session.fail(FlowError::BuilderFailure(e.to_string()));
                return session;
            }
        };

        let request = match SigningRequest::new(unsigned, &session.target.to_string()) {
            Ok(r) => r,
            Err(e) => {
                session.fail(e.into());
                return session;
            }
        };

        let payload = match Envelope::Request(request.clone()).encode() {
            Ok(p) => p,
            Err(e) => {
                session.fail(e.into());
                return session;
            }
        };

        match encode_payload(&payload, session.frame_capacity) {
            Ok(frames) => {
                debug!(
                    request_id = %request.request_id,
                    frames = frames.frames.len(),
                    animated = frames.is_animated,
                    "request encoded for display"
                );
                session.request = Some(request);
                session.frames = Some(frames);
                session.state = FlowState::DisplayingQr;
            }
            Err(e) => session.fail(e.into()),
        }

        session
    }

    /// Current state.
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The outstanding request's id, while one exists.
    pub fn request_id(&self) -> Option<&str> {
        self.request.as_ref().map(|r| r.request_id.as_str())
    }

    /// The frames for the QR rendering collaborator, while displayable.
    pub fn frames(&self) -> Option<&FrameSet> {
        self.frames.as_ref()
    }

    /// Terminal outcome, once reached.
    pub fn outcome(&self) -> Option<&FlowOutcome> {
        self.outcome.as_ref()
    }

    /// Corrupt frames dropped so far — a UI might surface "having trouble
    /// reading the code" past some threshold.
    pub fn corrupt_frames(&self) -> u32 {
        self.corrupt_frames
    }

    /// Moves from `DisplayingQr` to `ScanningResponse` — the user pointed
    /// the camera at the signer. Ignored in any other state.
    pub fn begin_scanning(&mut self) {
        if !self.ensure_live() {
            return;
        }
        if self.state == FlowState::DisplayingQr {
            self.state = FlowState::ScanningResponse;
        }
    }

    /// Moves back from `ScanningResponse` to `DisplayingQr` — the user
    /// wants the request code on screen again. The outstanding request
    /// and any partially reassembled response are kept: re-display is not
    /// a restart.
    pub fn redisplay(&mut self) {
        if !self.ensure_live() {
            return;
        }
        if self.state == FlowState::ScanningResponse {
            self.state = FlowState::DisplayingQr;
        }
    }

    /// Applies one scan event: the raw text content of one QR read.
    ///
    /// Gated: consumed only in `ScanningResponse`. A scan that completes
    /// the payload drives the whole `Verifying` pipeline synchronously,
    /// so the caller observes `Success` or `Failed` on return.
    pub fn on_scan(&mut self, text: &str) -> FlowState {
        if !self.ensure_live() {
            return self.state;
        }
        if self.state != FlowState::ScanningResponse {
            debug!(state = ?self.state, "scan event ignored outside ScanningResponse");
            return self.state;
        }

        match self.buffer.accept_text(text) {
            Ok(DecodeOutcome::Complete(payload)) => self.verify_payload(&payload),
            Ok(DecodeOutcome::Incomplete { received, total }) => {
                debug!(received, total, "response frame accepted");
            }
            Ok(DecodeOutcome::AlreadyComplete) => {}
            Err(FrameError::CorruptFrame(reason)) => {
                // Recovered locally: the display loop will repeat the
                // frame, so we just count it and keep scanning.
                self.corrupt_frames += 1;
                warn!(%reason, count = self.corrupt_frames, "dropped corrupt frame");
            }
            Err(e @ FrameError::InvalidInput(_)) => {
                // Not producible by accept_text today; fail loudly rather
                // than swallow a future codec change.
                self.fail(e.into());
            }
        }

        self.state
    }

    /// The camera collaborator's failure channel — permission denied,
    /// device lost. Terminal for the session; this is not scan content.
    pub fn report_scan_error(&mut self, message: &str) {
        if !self.ensure_live() {
            return;
        }
        self.fail(FlowError::ScanError(message.to_string()));
    }

    /// Cancels the session: stops consuming scans, invalidates the
    /// request id, and releases the reassembly buffer. A late-arriving
    /// response has nothing left to match against.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!(address = %self.target, "flow cancelled");
        self.enter_cancelled();
    }

    /// Discards this (failed) session and starts over: fresh request,
    /// fresh `request_id`, fresh buffer.
    ///
    /// Only meaningful from `Failed`; calling it from any other state
    /// returns the session unchanged — a cancelled flow stays cancelled.
    pub async fn retry(self) -> FlowSession {
        if self.state != FlowState::Failed {
            return self;
        }
        info!(address = %self.target, "retrying airgap verification flow");
        FlowSession::start(
            self.builder,
            self.frame_capacity,
            self.generations,
            self.target,
        )
        .await
    }

    // -- internals ----------------------------------------------------------

    /// The decode → discriminate → validate → verify pipeline, run once a
    /// full payload is in hand. Each step short-circuits to `Failed` with
    /// its own error; their order is load-bearing (see the validator).
    fn verify_payload(&mut self, payload: &[u8]) {
        self.state = FlowState::Verifying;

        // The request must exist in ScanningResponse; a session without
        // one never left Building.
        let Some(request) = self.request.clone() else {
            self.fail(FlowError::NotAResponse);
            return;
        };

        let result = (|| -> Result<String, FlowError> {
            let envelope = Envelope::decode(payload)?;

            // Positive discrimination before anything treats this as a
            // response — a camera reads whatever is in front of it,
            // including our own displayed request.
            let Some(response) = envelope.into_response() else {
                return Err(FlowError::NotAResponse);
            };

            validate_response(&response, &request)?;

            // The validator guarantees exactly one signed transaction.
            let report =
                verify_signed_transaction(&response.signed_txns[0], &request.target_address)?;
            Ok(report.signer_address)
        })();

        match result {
            Ok(signer_address) => {
                info!(signer = %signer_address, "airgap verification succeeded");
                self.state = FlowState::Success;
                self.outcome = Some(FlowOutcome::Verified { signer_address });
            }
            Err(error) => self.fail(error),
        }
    }

    fn fail(&mut self, error: FlowError) {
        warn!(%error, address = %self.target, "airgap verification failed");
        self.state = FlowState::Failed;
        self.outcome = Some(FlowOutcome::Failed { error });
        self.request = None;
        self.buffer.reset();
        self.frames = None;
    }

    fn enter_cancelled(&mut self) {
        self.state = FlowState::Cancelled;
        self.outcome = Some(FlowOutcome::Cancelled);
        self.request = None;
        self.buffer.reset();
        self.frames = None;
    }

    /// Event gate: `false` if the session is terminal or superseded.
    /// A superseded session cancels itself on the spot — its events must
    /// never touch state a newer session now owns.
    fn ensure_live(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let current = self.generations.lock().get(&self.target.to_string()).copied();
        if current != Some(self.generation) {
            debug!(
                address = %self.target,
                generation = self.generation,
                "session superseded by a newer flow, self-cancelling"
            );
            self.enter_cancelled();
            return false;
        }
        true
    }
}

impl std::fmt::Debug for FlowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSession")
            .field("state", &self.state)
            .field("target", &self.target)
            .field("request_id", &self.request_id())
            .field("generation", &self.generation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
