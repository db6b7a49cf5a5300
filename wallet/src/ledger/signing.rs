//! # Transaction Signing & Signed-Transaction Wire Codec
//!
//! Two jobs live here:
//!
//! 1. [`sign_transaction`] — sign a transaction in place with a local
//!    keypair. In the airgap flows this runs on the *signer* side (and in
//!    our tests, which play the signer); the wallet proper never calls it
//!    for keys it doesn't hold.
//! 2. [`encode_txn`] / [`decode_signed`] — the ledger's standard wire
//!    form for a signed transaction, and the canonicalizer that takes raw
//!    signed bytes back apart into `(canonical bytes, signature, claimed
//!    public key)`. This is the surface the offline signature verifier
//!    builds on: it never trusts any bytes the signer *claims* were
//!    signed — it re-derives the canonical form from the decoded fields.
//!
//! The wire form is bincode. Compact, deterministic for our field types,
//! and the same codec the rest of the wallet uses for binary payloads.

use thiserror::Error;

use crate::crypto::keys::{LumenKeypair, LumenPublicKey, LumenSignature};
use crate::ledger::transaction::LedgerTransaction;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from decoding a signed transaction off the wire.
#[derive(Debug, Error)]
pub enum SignedTxnError {
    /// The bytes are not a bincode-encoded transaction at all.
    #[error("undecodable signed transaction: {0}")]
    Undecodable(String),

    /// The decoded transaction carries no signature.
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The signature field is present but not 64 hex-decodable bytes.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The decoded transaction carries no signer public key.
    #[error("transaction has no embedded signer public key")]
    MissingPublicKey,

    /// The public key field is present but not a valid Ed25519 point.
    #[error("malformed signer public key: {0}")]
    MalformedPublicKey(String),
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Signs a transaction in place.
///
/// Computes [`LedgerTransaction::signable_bytes`], produces an Ed25519
/// signature over them, and stores the hex-encoded signature and public
/// key on the transaction. The transaction `id` is unaffected — it is
/// derived from the same signable bytes and fixed at build time.
///
/// Returns a reference to the (now signed) transaction for chaining.
pub fn sign_transaction<'a>(
    tx: &'a mut LedgerTransaction,
    keypair: &LumenKeypair,
) -> &'a LedgerTransaction {
    let signable = tx.signable_bytes();
    let signature = keypair.sign(&signable);
    tx.signature = Some(signature.to_hex());
    tx.signer_public_key = Some(keypair.public_key().to_hex());
    tx
}

// ---------------------------------------------------------------------------
// Wire codec / canonicalizer
// ---------------------------------------------------------------------------

/// A signed transaction taken apart for verification.
///
/// `canonical_bytes` is re-derived from the decoded transaction fields,
/// never read from the wire — a signer cannot present one transaction and
/// a signature over a different one.
#[derive(Debug)]
pub struct DecodedSignedTxn {
    /// The decoded transaction itself.
    pub transaction: LedgerTransaction,
    /// Canonical signable bytes re-derived from the decoded fields.
    pub canonical_bytes: Vec<u8>,
    /// The signature the transaction carries.
    pub signature: LumenSignature,
    /// The public key the signer claims to have signed with. Claims are
    /// cheap — the caller checks both the address derivation and the
    /// signature before believing it.
    pub claimed_key: LumenPublicKey,
}

/// Encodes a transaction — signed or not — into the ledger's wire form.
///
/// The same encoding carries the unsigned transaction out to the airgap
/// signer and the signed one back; only the signature fields differ.
pub fn encode_txn(tx: &LedgerTransaction) -> Result<Vec<u8>, SignedTxnError> {
    bincode::serialize(tx).map_err(|e| SignedTxnError::Undecodable(e.to_string()))
}

/// Decodes wire bytes into a transaction without requiring a signature.
///
/// This is what a signer-side implementation uses to read the unsigned
/// transaction out of a request before signing it.
pub fn decode_txn(bytes: &[u8]) -> Result<LedgerTransaction, SignedTxnError> {
    bincode::deserialize(bytes).map_err(|e| SignedTxnError::Undecodable(e.to_string()))
}

/// Decodes raw signed-transaction bytes into their verification parts.
///
/// Structural only: this confirms the bytes parse and that signature
/// material is present and well-formed. It does **not** verify the
/// signature — that is the offline verifier's job, and keeping the two
/// steps separate keeps "couldn't read it" distinct from "read it and
/// it's a forgery".
pub fn decode_signed(bytes: &[u8]) -> Result<DecodedSignedTxn, SignedTxnError> {
    let tx: LedgerTransaction =
        bincode::deserialize(bytes).map_err(|e| SignedTxnError::Undecodable(e.to_string()))?;

    let sig_hex = tx
        .signature
        .as_deref()
        .ok_or(SignedTxnError::MissingSignature)?;
    let signature = LumenSignature::from_hex(sig_hex)
        .map_err(|e| SignedTxnError::MalformedSignature(e.to_string()))?;

    let key_hex = tx
        .signer_public_key
        .as_deref()
        .ok_or(SignedTxnError::MissingPublicKey)?;
    let key_bytes =
        hex::decode(key_hex).map_err(|e| SignedTxnError::MalformedPublicKey(e.to_string()))?;
    let claimed_key = LumenPublicKey::try_from_slice(&key_bytes)
        .map_err(|e| SignedTxnError::MalformedPublicKey(e.to_string()))?;

    let canonical_bytes = tx.signable_bytes();

    Ok(DecodedSignedTxn {
        transaction: tx,
        canonical_bytes,
        signature,
        claimed_key,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
