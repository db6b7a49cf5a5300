//! # Airgap Envelope Protocol
//!
//! The message shapes exchanged between the wallet and an airgap signer
//! over the QR frame transport: a [`SigningRequest`] out, a
//! [`SigningResponse`] back.
//!
//! Envelopes are JSON with a `kind` discriminant, modeled as a tagged
//! [`Envelope`] enum so that "is this a response?" is a total, type-safe
//! question answered at the decode boundary — not a runtime probe of a
//! loosely-typed blob. This matters more than it looks: the bytes we
//! decode came off a *camera*. They may be a different protocol's QR
//! code, a Wi-Fi config, or a restaurant menu. Decoding and
//! discrimination must never panic and never guess.
//!
//! Byte fields are hex-armored in the JSON. Wasteful next to raw binary,
//! but envelopes are small, hex survives every JSON tooling path on the
//! signer side, and debuggability of a protocol you can only observe
//! through two phone screens is worth paying for.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::address::LumenAddress;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from envelope construction and (de)serialization.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The target address failed the ledger's address grammar.
    #[error("invalid target address '{address}': {reason}")]
    InvalidTarget {
        /// The offending address string.
        address: String,
        /// Why the address parser rejected it.
        reason: String,
    },

    /// The bytes did not decode as any known envelope shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// An envelope failed to serialize. Effectively unreachable for these
    /// types, but crypto-adjacent code doesn't get to unwrap.
    #[error("envelope serialization failed: {0}")]
    Serialize(String),
}

// ---------------------------------------------------------------------------
// Hex armoring for byte fields
// ---------------------------------------------------------------------------

/// Serde adapter: `Vec<u8>` as a hex string in JSON.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: `Vec<Vec<u8>>` as a list of hex strings in JSON.
mod hex_bytes_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(list: &[Vec<u8>], ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(list.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let strings = Vec::<String>::deserialize(de)?;
        strings
            .iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request for the airgap signer to sign exactly one transaction.
///
/// Immutable once constructed, and owned by exactly one flow session —
/// the `request_id` is what later binds the signer's response back to
/// this request and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    /// Fresh UUIDv4 per flow. 122 bits of randomness makes collision
    /// with a stale or concurrent request a non-event.
    pub request_id: String,

    /// The address whose key the signer is expected to use.
    pub target_address: String,

    /// The unsigned transaction, in the ledger's canonical encoding.
    #[serde(with = "hex_bytes")]
    pub unsigned_txn: Vec<u8>,

    /// Unix milliseconds at construction. Diagnostic only — the airgap
    /// signer's clock is nobody's source of truth.
    pub created_at: u64,
}

impl SigningRequest {
    /// Creates a request with a fresh `request_id`.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if `target_address` is empty or fails the ledger
    /// address grammar (delegated to [`LumenAddress::parse`]).
    pub fn new(unsigned_txn: Vec<u8>, target_address: &str) -> Result<Self, EnvelopeError> {
        LumenAddress::parse(target_address).map_err(|e| EnvelopeError::InvalidTarget {
            address: target_address.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            request_id: Uuid::new_v4().to_string(),
            target_address: target_address.to_string(),
            unsigned_txn,
            created_at: Utc::now().timestamp_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Error detail attached to a rejected response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Machine-readable code assigned by the signer.
    pub code: String,
    /// Human-readable explanation, surfaced to the user verbatim.
    pub message: String,
}

/// The airgap signer's answer to a [`SigningRequest`].
///
/// Produced by the external device and only ever *read* by the wallet.
/// Nothing here is trusted until the response validator and the offline
/// signature verifier have both had their say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningResponse {
    /// Echo of the request's id.
    pub request_id: String,

    /// `true` if the signer approved and signed.
    pub ok: bool,

    /// Signed transactions in the ledger's wire encoding. A compliant
    /// signer returns exactly one; the validator enforces that.
    #[serde(with = "hex_bytes_list", default)]
    pub signed_txns: Vec<Vec<u8>>,

    /// Present when `ok` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ResponseError>,
}

impl SigningResponse {
    /// An approval carrying signed transaction bytes. Exists for the
    /// signer side of tests and the demo harness.
    pub fn approved(request_id: &str, signed_txns: Vec<Vec<u8>>) -> Self {
        Self {
            request_id: request_id.to_string(),
            ok: true,
            signed_txns,
            err: None,
        }
    }

    /// A rejection with the signer's stated reason.
    pub fn rejected(request_id: &str, code: &str, message: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            ok: false,
            signed_txns: Vec::new(),
            err: Some(ResponseError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The tagged union of everything that may legitimately cross the airgap.
///
/// The serde `kind` tag is the wire discriminant; matching on the enum is
/// exhaustive, so adding a message type forces every decode site to say
/// what it does with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Envelope {
    /// Wallet → signer: sign exactly one transaction.
    #[serde(rename = "single-transaction")]
    Request(SigningRequest),

    /// Signer → wallet: the verdict.
    #[serde(rename = "signing-response")]
    Response(SigningResponse),
}

impl Envelope {
    /// Serializes the envelope to its payload bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Serialize(e.to_string()))
    }

    /// Deserializes payload bytes into an envelope.
    ///
    /// Total over untrusted input: every failure — not JSON, unknown
    /// `kind`, missing fields, un-hexable byte fields — is a
    /// `MalformedEnvelope` result, never a panic.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))
    }

    /// Positive type discrimination: is this envelope a response?
    ///
    /// Callers must check this before treating a decoded envelope as a
    /// response. Successful decoding alone proves only that *some* valid
    /// envelope arrived — scanning our own displayed request back is the
    /// classic way to hit the `Request` arm here.
    pub fn is_response(&self) -> bool {
        matches!(self, Envelope::Response(_))
    }

    /// Extracts the response, if that's what this is.
    pub fn into_response(self) -> Option<SigningResponse> {
        match self {
            Envelope::Response(r) => Some(r),
            Envelope::Request(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
