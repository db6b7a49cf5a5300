//! # Offline Signature Verification
//!
//! Proves, from nothing but bytes already in hand, that an airgap signer
//! controls the key behind a given address: the returned transaction must
//! carry a valid Ed25519 signature over its own canonical bytes, made by
//! a key that derives to the expected address.
//!
//! **This module never touches the network, by design.** The point of
//! the check — proving device control over a key before the wallet
//! trusts it — must hold in a basement with airplane mode on. There is
//! no RPC client to call here, no collaborator that could sneak one in:
//! the function's only inputs are its arguments. A caller that wants
//! on-chain confirmation later does that as a separate, explicit step
//! somewhere else.
//!
//! Decoding of the signed bytes is delegated to the ledger codec
//! ([`crate::ledger::signing::decode_signed`]); this module only
//! orchestrates the checks and keeps their order honest:
//! address-derivation before signature, so a key-substitution attempt is
//! named for what it is rather than surfacing as a generic bad signature.

use thiserror::Error;
use tracing::debug;

use crate::ledger::address::{AddressError, LumenAddress};
use crate::ledger::signing::{decode_signed, SignedTxnError};
use crate::ledger::transaction::LedgerTransaction;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons offline verification fails.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The signed bytes did not decode as a ledger transaction with
    /// well-formed signature material.
    #[error("malformed signed transaction: {0}")]
    MalformedTransaction(#[from] SignedTxnError),

    /// The expected-signer address itself failed to parse. With addresses
    /// validated at request construction this is unreachable in the flow,
    /// but this is a public API and garbage in gets a typed error out.
    #[error("expected signer address is invalid: {0}")]
    BadExpectedAddress(#[from] AddressError),

    /// The embedded public key does not derive to the expected address.
    #[error("signer mismatch: key derives to {derived}, expected {expected}")]
    SignerMismatch {
        /// The address the wallet asked about.
        expected: String,
        /// The address the embedded key actually derives to.
        derived: String,
    },

    /// The signature does not verify over the canonical transaction bytes.
    #[error("invalid signature from {signer}")]
    InvalidSignature {
        /// The (address-matching) signer whose signature failed.
        signer: String,
    },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The successful outcome: who provably signed.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// The verified signer's address — equal to the expected address by
    /// construction, returned so callers don't have to thread it through.
    pub signer_address: String,
    /// The decoded transaction the signature covers, for any further
    /// inspection the caller wants to do.
    pub transaction: LedgerTransaction,
}

/// Verifies that `signed` is a valid signature over the exact canonical
/// transaction it contains, made by the key behind `expected_signer`.
///
/// The checks, in order:
///
/// 1. **Decode** — the bytes must parse as a signed ledger transaction
///    (delegated to the ledger codec, which re-derives the canonical
///    bytes from the decoded fields rather than trusting the wire).
/// 2. **Address binding** — the embedded public key must BLAKE3-derive to
///    `expected_signer`. An attacker can embed any key they control, but
///    not one that hashes to somebody else's address.
/// 3. **Signature** — Ed25519 verification of the signature over the
///    canonical bytes, against the (now address-bound) key.
pub fn verify_signed_transaction(
    signed: &[u8],
    expected_signer: &str,
) -> Result<VerificationReport, VerifyError> {
    let expected = LumenAddress::parse(expected_signer)?;

    // 1. Structural decode via the ledger codec.
    let decoded = decode_signed(signed)?;

    // 2. The claimed key must be the expected address's key.
    if !expected.is_derived_from(&decoded.claimed_key) {
        let derived = LumenAddress::from_public_key(&decoded.claimed_key).to_string();
        return Err(VerifyError::SignerMismatch {
            expected: expected_signer.to_string(),
            derived,
        });
    }

    // 3. The signature must cover the canonical bytes.
    if !decoded
        .claimed_key
        .verify(&decoded.canonical_bytes, &decoded.signature)
    {
        return Err(VerifyError::InvalidSignature {
            signer: expected_signer.to_string(),
        });
    }

    debug!(signer = %expected_signer, txn_id = %decoded.transaction.id, "offline verification passed");

    Ok(VerificationReport {
        signer_address: expected_signer.to_string(),
        transaction: decoded.transaction,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LumenKeypair;
    use crate::ledger::signing::{encode_txn, sign_transaction};
    use crate::ledger::transaction::TransactionBuilder;

    /// A proof-of-control transaction signed by its own target key, as a
    /// well-behaved airgap signer would produce it.
    fn well_signed(kp: &LumenKeypair) -> (Vec<u8>, String) {
        let target = LumenAddress::from_public_key(&kp.public_key());
        let mut tx = TransactionBuilder::proof_of_control(&target)
            .nonce(1)
            .timestamp(1_700_000_000_000)
            .build();
        sign_transaction(&mut tx, kp);
        (encode_txn(&tx).unwrap(), target.to_string())
    }

    #[test]
    fn valid_signature_yields_signer_address() {
        let kp = LumenKeypair::generate();
        let (wire, addr) = well_signed(&kp);

        let report = verify_signed_transaction(&wire, &addr).unwrap();
        assert_eq!(report.signer_address, addr);
        assert!(report.transaction.is_proof_of_control());
    }

    #[test]
    fn wrong_signer_key_is_a_mismatch_not_a_bad_signature() {
        // A different key signs — correctly! — but it isn't the target's
        // key. Must surface as SignerMismatch, caught before the
        // signature is even checked.
        let target_kp = LumenKeypair::generate();
        let imposter = LumenKeypair::generate();

        let target = LumenAddress::from_public_key(&target_kp.public_key());
        let mut tx = TransactionBuilder::proof_of_control(&target).nonce(1).build();
        sign_transaction(&mut tx, &imposter);
        let wire = encode_txn(&tx).unwrap();

        match verify_signed_transaction(&wire, &target.to_string()) {
            Err(VerifyError::SignerMismatch { expected, derived }) => {
                assert_eq!(expected, target.to_string());
                assert_eq!(
                    derived,
                    LumenAddress::from_public_key(&imposter.public_key()).to_string()
                );
            }
            other => panic!("expected SignerMismatch, got {:?}", other),
        }
    }

    #[test]
    fn tampered_transaction_fails_signature_check() {
        // Right key, but the transaction was altered after signing: the
        // canonicalizer re-derives the bytes, so the signature no longer
        // covers them.
        let kp = LumenKeypair::generate();
        let target = LumenAddress::from_public_key(&kp.public_key());
        let mut tx = TransactionBuilder::proof_of_control(&target).nonce(1).build();
        sign_transaction(&mut tx, &kp);
        tx.amount = 5_000_000; // post-signing tamper

        let wire = encode_txn(&tx).unwrap();
        match verify_signed_transaction(&wire, &target.to_string()) {
            Err(VerifyError::InvalidSignature { .. }) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn forged_signature_bytes_fail() {
        let kp = LumenKeypair::generate();
        let target = LumenAddress::from_public_key(&kp.public_key());
        let mut tx = TransactionBuilder::proof_of_control(&target).nonce(1).build();
        sign_transaction(&mut tx, &kp);
        // Flip the signature to a syntactically valid but wrong value.
        tx.signature = Some(hex::encode([0x42u8; 64]));

        let wire = encode_txn(&tx).unwrap();
        assert!(matches!(
            verify_signed_transaction(&wire, &target.to_string()),
            Err(VerifyError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let kp = LumenKeypair::generate();
        let addr = LumenAddress::from_public_key(&kp.public_key()).to_string();
        assert!(matches!(
            verify_signed_transaction(b"\x00\x01 garbage", &addr),
            Err(VerifyError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn invalid_expected_address_is_typed() {
        let kp = LumenKeypair::generate();
        let (wire, _) = well_signed(&kp);
        assert!(matches!(
            verify_signed_transaction(&wire, "not-an-address"),
            Err(VerifyError::BadExpectedAddress(_))
        ));
    }

    #[test]
    fn verification_uses_only_its_inputs() {
        // The offline guarantee, stated as a test: the same inputs give
        // the same verdict, with no environment to consult and nothing to
        // await. (There is no network client in this module to mock — the
        // assertion is that the call is a pure function of its arguments.)
        let kp = LumenKeypair::generate();
        let (wire, addr) = well_signed(&kp);

        let first = verify_signed_transaction(&wire, &addr).unwrap();
        let second = verify_signed_transaction(&wire, &addr).unwrap();
        assert_eq!(first.signer_address, second.signer_address);
        assert_eq!(first.transaction, second.transaction);
    }
}
