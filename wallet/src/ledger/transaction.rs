//! # Ledger Transactions
//!
//! The wallet's view of a LUMEN ledger transaction: construction via the
//! builder pattern, a canonical byte form for signing, and a deterministic
//! id derived from it.
//!
//! The airgap subsystem cares about one construction in particular: the
//! **proof-of-control transaction** — a zero-value transfer from the target
//! address back to itself. It has no financial effect and is never
//! broadcast; its only purpose is to be signable, so that a signature over
//! it proves an external device holds the target's key.
//!
//! The builder does not sign — that happens in [`super::signing`]. The
//! separation keeps construction testable without key material, which is
//! exactly the situation the wallet is in during an airgap flow: it builds
//! the transaction, but only the external signer can sign it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::crypto::hash::double_sha256;
use crate::ledger::address::LumenAddress;

// ---------------------------------------------------------------------------
// LedgerTransaction
// ---------------------------------------------------------------------------

/// A LUMEN ledger transaction as the wallet constructs and inspects it.
///
/// The `id` field is the double-SHA-256 hash of the canonical serialization
/// of all fields *except* the signature material. The id is therefore
/// stable across signing — the wallet computes it before handing the
/// transaction to an airgap signer, and it does not change when the signed
/// copy comes back.
///
/// # Canonical Byte Format
///
/// Signing and id computation use [`LedgerTransaction::signable_bytes`]:
/// a deterministic concatenation with null-byte separators and fixed-width
/// little-endian integers. JSON/serde is intentionally avoided here because
/// field ordering is not guaranteed across serialization formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction id: `hex(double_sha256(signable_bytes))`.
    pub id: String,

    /// Transaction format version. Lets signers apply the right canonical
    /// layout when re-deriving the bytes they sign.
    pub version: u16,

    /// Sender address (Bech32, `lumen1...`).
    pub sender: String,

    /// Receiver address (Bech32). Equal to `sender` for proof-of-control
    /// transactions.
    pub receiver: String,

    /// Transfer amount in lux (the smallest LUMEN unit). Zero for
    /// proof-of-control transactions.
    pub amount: u64,

    /// Fee in lux. Zero for transactions that will never be broadcast.
    pub fee: u64,

    /// Per-sender sequence number.
    pub nonce: u64,

    /// Unix timestamp in milliseconds at construction time.
    pub timestamp: u64,

    /// Optional application payload (UTF-8 memos, binding tags).
    pub note: Option<Vec<u8>>,

    /// Hex-encoded public key of whoever signed. Embedded so a verifier
    /// needs no separate key lookup. `None` until signed.
    pub signer_public_key: Option<String>,

    /// Hex-encoded Ed25519 signature over [`signable_bytes`](Self::signable_bytes).
    /// `None` for unsigned transactions fresh from the builder.
    pub signature: Option<String>,
}

impl LedgerTransaction {
    /// The canonical byte representation used for signing and id computation.
    ///
    /// Excluded fields: `id`, `signer_public_key`, `signature`.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(192);

        // Format version (2 bytes, LE).
        buf.extend_from_slice(&self.version.to_le_bytes());

        // Sender address.
        buf.extend_from_slice(self.sender.as_bytes());
        buf.push(0x00);

        // Receiver address.
        buf.extend_from_slice(self.receiver.as_bytes());
        buf.push(0x00);

        // Amount, fee, nonce, timestamp as little-endian u64.
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());

        // Note (length-prefixed if present).
        if let Some(ref note) = self.note {
            buf.push(0x01); // note-present flag
            buf.extend_from_slice(&(note.len() as u32).to_le_bytes());
            buf.extend_from_slice(note);
        } else {
            buf.push(0x00); // no-note flag
        }

        buf
    }

    /// Computes the transaction id from the current field values.
    ///
    /// `id = hex(double_sha256(signable_bytes))`. Independent of signature
    /// state.
    pub fn compute_id(&self) -> String {
        hex::encode(double_sha256(&self.signable_bytes()))
    }

    /// `true` if the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// `true` if this is a zero-value self-addressed transaction — the
    /// shape a proof-of-control transaction must have.
    pub fn is_proof_of_control(&self) -> bool {
        self.amount == 0 && self.sender == self.receiver
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`LedgerTransaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use lumen_wallet::ledger::transaction::TransactionBuilder;
///
/// let tx = TransactionBuilder::new()
///     .sender("lumen1qw508d6...")
///     .receiver("lumen1pk3y7a...")
///     .amount(50_000)
///     .nonce(1)
///     .build();
/// ```
///
/// Defaults: current format version, zero amount and fee, timestamp set at
/// build time. All can be overridden.
pub struct TransactionBuilder {
    version: u16,
    sender: String,
    receiver: String,
    amount: u64,
    fee: u64,
    nonce: u64,
    timestamp: Option<u64>,
    note: Option<Vec<u8>>,
}

impl TransactionBuilder {
    /// Creates a new builder with default fields.
    pub fn new() -> Self {
        Self {
            version: config::TXN_FORMAT_VERSION,
            sender: String::new(),
            receiver: String::new(),
            amount: 0,
            fee: 0,
            nonce: 0,
            timestamp: None,
            note: None,
        }
    }

    /// Shorthand for the proof-of-control shape: zero value, fee-less,
    /// sender and receiver both set to `target`.
    ///
    /// The note binds the transaction to its purpose so that a signature
    /// over it cannot later be misrepresented as authorizing a payment.
    pub fn proof_of_control(target: &LumenAddress) -> Self {
        let addr = target.to_string();
        Self::new()
            .sender(&addr)
            .receiver(&addr)
            .amount(0)
            .note(b"lumen/proof-of-control".to_vec())
    }

    /// Sets the transaction format version. Only needed for testing
    /// version upgrades.
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Sets the sender address.
    pub fn sender(mut self, address: &str) -> Self {
        self.sender = address.to_string();
        self
    }

    /// Sets the receiver address.
    pub fn receiver(mut self, address: &str) -> Self {
        self.receiver = address.to_string();
        self
    }

    /// Sets the amount in lux.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the fee in lux.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the sender's nonce (sequence number).
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the timestamp explicitly (Unix milliseconds).
    ///
    /// If not called, `build()` uses the current UTC time.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attaches a note payload.
    pub fn note(mut self, data: Vec<u8>) -> Self {
        self.note = Some(data);
        self
    }

    /// Consumes the builder and produces an unsigned [`LedgerTransaction`]
    /// with its id computed from the signable bytes.
    pub fn build(self) -> LedgerTransaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);

        let mut tx = LedgerTransaction {
            id: String::new(),
            version: self.version,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            fee: self.fee,
            nonce: self.nonce,
            timestamp,
            note: self.note,
            signer_public_key: None,
            signature: None,
        };

        tx.id = tx.compute_id();
        tx
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
