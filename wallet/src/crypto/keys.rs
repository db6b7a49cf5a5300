//! # Key Management
//!
//! Ed25519 keypair handling for LUMEN wallet accounts.
//!
//! The wallet holds keys for its own accounts, and — in the airgap flows —
//! reasons about keys it does *not* hold: the whole point of remote signing
//! is proving that some external device controls a key. Both sides of that
//! story live here: [`LumenKeypair`] for keys we have, [`LumenPublicKey`]
//! and [`LumenSignature`] for keys and signatures we merely check.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security in 32+32 bytes. Compact enough for QR transport.
//! - Constant-time implementations exist and are well-audited.
//!
//! ## Security considerations
//!
//! - We use OS-level RNG (`OsRng`) for key generation.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details
/// about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// LumenKeypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair for a LUMEN account.
///
/// Every address and every signature traces back to one of these. In the
/// airgap verification flow the *wallet* usually doesn't hold the keypair
/// at all — the external signer does — but tests and the simulated signer
/// need a real one, and so does any account the wallet manages directly.
///
/// `LumenKeypair` deliberately does NOT implement `Serialize`/`Deserialize`.
/// Serializing private keys should be a conscious act, not something that
/// happens because a keypair ended up inside a JSON response. Use
/// `secret_key_bytes()` / `from_seed()` explicitly.
pub struct LumenKeypair {
    signing_key: SigningKey,
}

impl LumenKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. Useful for deriving
    /// keypairs from mnemonics or KDF output. A weak seed gives a weak key —
    /// use a proper CSPRNG or KDF to produce the bytes.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> LumenPublicKey {
        LumenPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes). Safe to share, log, print on a mug.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message.
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No nonce management, no RNG at
    /// signing time, no sleepless nights.
    pub fn sign(&self, message: &[u8]) -> LumenSignature {
        let sig = self.signing_key.sign(message);
        LumenSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's own public key.
    pub fn verify(&self, message: &[u8], signature: &LumenSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Export the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** This is the only secret standing
    /// between an attacker and full control of the account. Don't log it,
    /// don't ship it over the network, don't paste it into a bug report.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for LumenKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for LumenKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material in debug output. Not even "partially".
        write!(f, "LumenKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for LumenKeypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for identity
    /// purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for LumenKeypair {}

// ---------------------------------------------------------------------------
// LumenPublicKey
// ---------------------------------------------------------------------------

/// The public half of a LUMEN identity, safe to share with the world.
///
/// For airgap flows this is the interesting type: the external signer's
/// public key arrives embedded in its signed transaction, and the wallet
/// re-derives the claimed address from these bytes before trusting anything.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LumenPublicKey {
    bytes: [u8; 32],
}

impl LumenPublicKey {
    /// Create a public key from raw bytes without curve validation.
    ///
    /// Verification against an invalid point simply fails, so deferring
    /// validation to [`verify`](Self::verify) is safe; use
    /// [`try_from_slice`](Self::try_from_slice) when you want the error up front.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Create a public key from a slice, validating length and that the
    /// bytes are a real Ed25519 point. Catches low-order points and other
    /// degenerate encodings.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns a plain boolean — the vast majority of callers want a
    /// yes/no answer, and a malformed key or signature is simply "no".
    pub fn verify(&self, message: &[u8], signature: &LumenSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes: arr })
    }
}

impl Hash for LumenPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for LumenPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for LumenPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LumenPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// LumenSignature
// ---------------------------------------------------------------------------

/// An Ed25519 signature over a message. 64 bytes.
///
/// Stored as `Vec<u8>` for serde compatibility, but always exactly 64 bytes
/// when produced by us. If someone hands us a signature that isn't,
/// verification simply returns `false` — no panics, no undefined behavior.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LumenSignature {
    bytes: Vec<u8>,
}

impl LumenSignature {
    /// Create a signature from a raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature. Rejects anything that isn't exactly
    /// 64 bytes once decoded.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for LumenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for LumenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "LumenSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "LumenSignature({})", hex_str)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
