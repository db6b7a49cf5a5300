//! # Wallet Configuration & Constants
//!
//! Every magic number in LUMEN lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are tunable in the sense that changing them only
//! affects this wallet build. The exceptions are the wire-facing ones
//! (frame prefix, envelope `kind` discriminants, address HRP) — an airgap
//! signer in someone's pocket has its own copy of those, so treat them
//! like consensus parameters.

// ---------------------------------------------------------------------------
// Ledger Identity
// ---------------------------------------------------------------------------

/// Human-readable prefix for LUMEN addresses.
/// Bech32 HRP — short enough to type, long enough to be unambiguous.
pub const ADDRESS_HRP: &str = "lumen";

/// Wallet protocol version string, assembled at compile time so we don't
/// allocate for something this trivial at runtime.
pub const WALLET_VERSION: &str = "0.1.0";

/// Ledger transaction format version. Bump on breaking changes to the
/// canonical signable-bytes layout. Signers reject versions they don't know.
pub const TXN_FORMAT_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 — the only sane choice for signatures in 2024+.
/// Deterministic, compact, and resistant to side-channel attacks when
/// implemented correctly (which ed25519-dalek is).
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Airgap Frame Transport
// ---------------------------------------------------------------------------

/// Magic prefix on every QR frame line. A scanner can reject non-LUMEN
/// QR codes (boarding passes, restaurant menus, other wallets) on the
/// first five bytes without parsing further. The trailing digit is the
/// frame format version.
pub const FRAME_PREFIX: &str = "LMQR1";

/// Default maximum payload bytes per frame, before text armoring.
///
/// 300 raw bytes become ~410 characters of base58, which sits comfortably
/// inside QR version 12 at medium error correction — the practical limit
/// for a handheld phone camera scanning another phone's screen in
/// imperfect light. Callers with better optics can raise this per call.
pub const DEFAULT_FRAME_CAPACITY: usize = 300;

/// Playback rate hint for animated frame sequences, in frames per second.
///
/// 5 Hz means a 10-frame payload fully cycles every 2 seconds. Faster
/// loses frames to camera shutter lag; slower makes users hold two phones
/// face-to-face awkwardly for longer than anyone wants to.
pub const FRAME_RATE_HZ: u32 = 5;

/// Upper bound on frames per payload.
///
/// 1024 frames at the default capacity is ~300 KB — two orders of
/// magnitude above any real signing request. A payload that blows past
/// this is a bug upstream, and refusing it beats asking a user to film
/// someone else's phone for three and a half minutes.
pub const MAX_FRAME_COUNT: usize = 1024;

/// Length of the hex-encoded fragment id embedded in every frame.
///
/// 16 hex characters = 64 bits of the payload's BLAKE3 hash. Collisions
/// between the handful of payloads a wallet encodes per session are not
/// a realistic concern at this width, and every character costs QR real
/// estate on all frames.
pub const FRAGMENT_ID_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Airgap Envelope Protocol
// ---------------------------------------------------------------------------

/// The `kind` discriminant for a single-transaction signing request.
/// Wire-facing string — changing it strands every deployed signer.
pub const KIND_SINGLE_TXN_REQUEST: &str = "single-transaction";

/// The `kind` discriminant for a signing response.
pub const KIND_SIGNING_RESPONSE: &str = "signing-response";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_capacity_is_sane() {
        // A frame must hold at least one byte, and the default should stay
        // within what a phone camera reliably scans (< 1 KB of QR text).
        assert!(DEFAULT_FRAME_CAPACITY >= 1);
        assert!(DEFAULT_FRAME_CAPACITY <= 900);
    }

    #[test]
    fn fragment_id_length_is_even() {
        // Hex encoding of whole bytes — odd lengths would mean half a byte.
        assert_eq!(FRAGMENT_ID_LENGTH % 2, 0);
    }

    #[test]
    fn kind_discriminants_differ() {
        assert_ne!(KIND_SINGLE_TXN_REQUEST, KIND_SIGNING_RESPONSE);
    }
}
