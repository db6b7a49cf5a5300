//! # LUMEN Addresses
//!
//! A LUMEN address is the human-facing form of an account identity,
//! derived from the account's Ed25519 public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key) -> 32 bytes
//!     -> Bech32("lumen", hash) -> lumen1qw508d6qe...
//! ```
//!
//! The `lumen` human-readable prefix makes addresses immediately
//! recognizable, and Bech32's checksum catches the copy-paste mangling
//! that inevitably happens when addresses travel through chat apps.
//!
//! The hash indirection matters for the airgap flows: the wallet knows a
//! target *address* long before it ever sees the public key behind it.
//! Only when the external signer returns a signed transaction does the
//! wallet learn the key — and [`LumenAddress::from_public_key`] is how it
//! checks that the key actually belongs to the address it asked about.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config;
use crate::crypto::keys::LumenPublicKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing a LUMEN address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded (bad charset, bad checksum).
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// LumenAddress
// ---------------------------------------------------------------------------

/// A LUMEN account address.
///
/// Internally stores the BLAKE3 hash of the originating public key; the
/// Bech32 string form is computed on demand.
///
/// # Examples
///
/// ```
/// use lumen_wallet::crypto::keys::LumenKeypair;
/// use lumen_wallet::ledger::address::LumenAddress;
///
/// let kp = LumenKeypair::generate();
/// let addr = LumenAddress::from_public_key(&kp.public_key());
/// assert!(addr.to_string().starts_with("lumen1"));
///
/// let parsed = LumenAddress::parse(&addr.to_string()).unwrap();
/// assert_eq!(addr, parsed);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LumenAddress {
    /// BLAKE3 hash of the public key. This is what gets Bech32-encoded.
    key_hash: [u8; 32],
}

impl LumenAddress {
    /// Derive the address of a public key.
    pub fn from_public_key(pk: &LumenPublicKey) -> Self {
        Self {
            key_hash: *blake3::hash(pk.as_bytes()).as_bytes(),
        }
    }

    /// Parse a Bech32-encoded LUMEN address.
    ///
    /// Validates charset, checksum, HRP, and data length. This is the
    /// address grammar check the airgap envelope layer delegates to when
    /// it rejects a malformed target with `InvalidTarget`.
    pub fn parse(addr: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(config::ADDRESS_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressError::InvalidHrp {
                expected: config::ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        let key_hash: [u8; 32] = data
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidDataLength {
                expected: 32,
                got: data.len(),
            })?;

        Ok(Self { key_hash })
    }

    /// `true` if `pk` is the key this address was derived from.
    ///
    /// The key-substitution check: an attacker can put any public key they
    /// like inside a signed transaction, but they can't make a key they
    /// control hash to someone else's address.
    pub fn is_derived_from(&self, pk: &LumenPublicKey) -> bool {
        blake3::hash(pk.as_bytes()).as_bytes() == &self.key_hash
    }

    /// The raw 32-byte BLAKE3 hash underlying this address.
    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }
}

impl fmt::Display for LumenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = Hrp::parse(config::ADDRESS_HRP).expect("static HRP is valid");
        let encoded = bech32::encode::<Bech32>(hrp, &self.key_hash)
            .expect("encoding a 32-byte payload should never fail");
        write!(f, "{}", encoded)
    }
}

impl fmt::Debug for LumenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LumenAddress({})", self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LumenKeypair;

    #[test]
    fn address_roundtrip() {
        let kp = LumenKeypair::generate();
        let addr = LumenAddress::from_public_key(&kp.public_key());
        let s = addr.to_string();
        assert!(s.starts_with("lumen1"));

        let parsed = LumenAddress::parse(&s).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn derivation_is_deterministic() {
        let kp = LumenKeypair::generate();
        let a1 = LumenAddress::from_public_key(&kp.public_key());
        let a2 = LumenAddress::from_public_key(&kp.public_key());
        assert_eq!(a1, a2);
    }

    #[test]
    fn different_keys_different_addresses() {
        let a1 = LumenAddress::from_public_key(&LumenKeypair::generate().public_key());
        let a2 = LumenAddress::from_public_key(&LumenKeypair::generate().public_key());
        assert_ne!(a1, a2);
    }

    #[test]
    fn is_derived_from_matches_only_originating_key() {
        let kp = LumenKeypair::generate();
        let other = LumenKeypair::generate();
        let addr = LumenAddress::from_public_key(&kp.public_key());

        assert!(addr.is_derived_from(&kp.public_key()));
        assert!(!addr.is_derived_from(&other.public_key()));
    }

    #[test]
    fn rejects_wrong_hrp() {
        // A valid bech32 string with a foreign prefix must not parse.
        let hrp = Hrp::parse("btc").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, &[0u8; 32]).unwrap();
        match LumenAddress::parse(&foreign) {
            Err(AddressError::InvalidHrp { .. }) => {}
            other => panic!("expected InvalidHrp, got {:?}", other),
        }
    }

    #[test]
    fn rejects_wrong_data_length() {
        let hrp = Hrp::parse(config::ADDRESS_HRP).unwrap();
        let short = bech32::encode::<Bech32>(hrp, &[0u8; 16]).unwrap();
        match LumenAddress::parse(&short) {
            Err(AddressError::InvalidDataLength {
                expected: 32,
                got: 16,
            }) => {}
            other => panic!("expected InvalidDataLength, got {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(LumenAddress::parse("").is_err());
        assert!(LumenAddress::parse("not an address").is_err());
        assert!(LumenAddress::parse("lumen1").is_err());
        // Mangle one character of a real address — checksum must catch it.
        let kp = LumenKeypair::generate();
        let mut s = LumenAddress::from_public_key(&kp.public_key()).to_string();
        let last = s.pop().unwrap();
        s.push(if last == 'q' { 'p' } else { 'q' });
        assert!(LumenAddress::parse(&s).is_err());
    }
}
