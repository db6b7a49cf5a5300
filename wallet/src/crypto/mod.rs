//! # Cryptographic Primitives
//!
//! Everything security-related in the wallet flows through here: signing
//! key material, signature checks, and the hash functions behind addresses,
//! transaction ids, and frame fragment ids.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **BLAKE3** for wallet-internal hashing — because we live in the future.
//! - **SHA-256** for ledger compatibility — because the ledger doesn't.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again.

pub mod hash;
pub mod keys;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{blake3_hash, domain_separated_hash, double_sha256, sha256};
pub use keys::{KeyError, LumenKeypair, LumenPublicKey, LumenSignature};
