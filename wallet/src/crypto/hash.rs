//! # Hashing Utilities
//!
//! The two hash functions LUMEN uses, and no more:
//!
//! - **BLAKE3** — Our default. Fast on every platform a phone ships with,
//!   and the basis for address derivation and frame fragment ids.
//! - **SHA-256** — For the ledger's transaction ids, which use the
//!   `double_sha256` construction the rest of the cryptocurrency world
//!   standardized on back when SHA-256 was the only game in town.
//!
//! There is no security reason to prefer SHA-256 over BLAKE3 — only
//! compatibility. Wallet-internal identifiers always use BLAKE3; anything
//! that must match the ledger's canonical encoding uses double-SHA-256.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Half the callers immediately
/// pass it to functions that want `&[u8]`, and the other half chain it
/// into [`double_sha256`] — the heap allocation is noise compared to the
/// cost of the hash itself.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// Used for ledger transaction ids. The double-hash protects against
/// length-extension, and more importantly it is what every external tool
/// that inspects LUMEN transactions already expects.
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. The workhorse hash of
/// the wallet — address derivation and fragment identification both
/// flow through here.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Domain separation prevents collisions across protocol contexts:
/// `domain_separated_hash("frame-id", data)` and
/// `domain_separated_hash("address", data)` never collide even for equal
/// `data`. Uses BLAKE3's built-in `derive_key` mode, which mixes the
/// context into the internal IV rather than naively prepending a tag.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc") — the NIST test vector everyone knows by heart.
        let hash = sha256(b"abc");
        assert_eq!(
            hex::encode(&hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn double_sha256_is_sha256_of_sha256() {
        let data = b"lumen wallet";
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
    }

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"payload"), blake3_hash(b"payload"));
        assert_ne!(blake3_hash(b"payload"), blake3_hash(b"payloae"));
    }

    #[test]
    fn domain_separation_prevents_cross_context_collision() {
        let data = b"identical input";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
    }

    #[test]
    fn all_digests_are_32_bytes() {
        assert_eq!(sha256(b"x").len(), 32);
        assert_eq!(double_sha256(b"x").len(), 32);
        assert_eq!(blake3_hash(b"x").len(), 32);
    }
}
