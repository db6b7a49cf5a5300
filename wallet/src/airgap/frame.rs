//! # QR Frame Codec
//!
//! Splits an opaque payload into a bounded sequence of fixed-capacity
//! frames for QR display, and reassembles a payload from frames scanned
//! in whatever order the camera happened to catch them.
//!
//! The transport has no acknowledgment channel: the display side cycles
//! every frame at a fixed rate, forever, and the scanning side keeps a
//! [`ReassemblyBuffer`] that is
//!
//! - **order-independent** — completeness is coverage of indices
//!   `0..frame_count`, not arrival sequence;
//! - **idempotent** — a frame scanned twice changes nothing;
//! - **restartable** — a frame from a different payload resets the buffer,
//!   so stale frames from an abandoned scan can't poison a new one;
//! - **lazy** — `Complete` fires exactly once, when the last missing
//!   index lands.
//!
//! ## Wire form
//!
//! Each frame renders to one line of plain text, suitable as QR content:
//!
//! ```text
//! LMQR1:<fragment-id>:<sequence-index>:<frame-count>:<base58 fragment>
//! ```
//!
//! The fragment id is a truncated, domain-separated BLAKE3 hash of the
//! whole payload — content-derived, so re-encoding the same payload is
//! idempotent and two concurrent payloads can't be confused for each
//! other. Anything that fails to parse as this shape is a
//! [`FrameError::CorruptFrame`]: reported to the caller, never fatal,
//! because the camera will hand us the frame again on the next cycle.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config;
use crate::crypto::hash::domain_separated_hash;

/// Domain-separation context for fragment ids. Changing this orphans every
/// in-flight scan, so don't.
const FRAGMENT_ID_CONTEXT: &str = "lumen-wallet 2026 airgap fragment id v1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the frame codec.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The encode input was unusable (empty payload, zero capacity, or a
    /// payload too large to animate within the frame-count bound).
    #[error("invalid encode input: {0}")]
    InvalidInput(String),

    /// A scanned frame failed structural parsing. Recoverable — the
    /// display loop will show the frame again.
    #[error("corrupt frame: {0}")]
    CorruptFrame(String),
}

// ---------------------------------------------------------------------------
// QrFrame
// ---------------------------------------------------------------------------

/// One unit of optical transport. Immutable once produced.
///
/// Invariants, enforced at construction and parse time:
/// `sequence_index < frame_count` and `frame_count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrFrame {
    /// Content-derived id shared by all frames of one payload.
    pub fragment_id: String,
    /// Position of this fragment, starting at 0.
    pub sequence_index: u32,
    /// Total frames in the payload. Identical across the set.
    pub frame_count: u32,
    /// The raw payload fragment this frame carries.
    pub fragment: Vec<u8>,
}

impl QrFrame {
    /// Renders the frame as its QR text line.
    pub fn to_text(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            config::FRAME_PREFIX,
            self.fragment_id,
            self.sequence_index,
            self.frame_count,
            bs58::encode(&self.fragment).into_string(),
        )
    }

    /// Parses a scanned QR text line back into a frame.
    ///
    /// Every malformation — wrong prefix, wrong field count, non-numeric
    /// indices, an index out of range, bad base58 — is a `CorruptFrame`.
    /// A camera hands us arbitrary text; none of it may panic.
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        let mut parts = text.splitn(5, ':');

        let prefix = parts.next().unwrap_or_default();
        if prefix != config::FRAME_PREFIX {
            return Err(FrameError::CorruptFrame(format!(
                "unrecognized frame prefix '{}'",
                truncate_for_log(prefix)
            )));
        }

        let fragment_id = parts
            .next()
            .ok_or_else(|| FrameError::CorruptFrame("missing fragment id".into()))?;
        if fragment_id.len() != config::FRAGMENT_ID_LENGTH
            || !fragment_id.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(FrameError::CorruptFrame(format!(
                "bad fragment id '{}'",
                truncate_for_log(fragment_id)
            )));
        }

        let sequence_index: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| FrameError::CorruptFrame("missing or non-numeric sequence index".into()))?;

        let frame_count: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| FrameError::CorruptFrame("missing or non-numeric frame count".into()))?;

        if frame_count == 0 {
            return Err(FrameError::CorruptFrame("frame count is zero".into()));
        }
        if sequence_index >= frame_count {
            return Err(FrameError::CorruptFrame(format!(
                "sequence index {} out of range for frame count {}",
                sequence_index, frame_count
            )));
        }

        let armored = parts
            .next()
            .ok_or_else(|| FrameError::CorruptFrame("missing fragment data".into()))?;
        let fragment = bs58::decode(armored)
            .into_vec()
            .map_err(|e| FrameError::CorruptFrame(format!("base58 decode failed: {}", e)))?;
        if fragment.is_empty() {
            return Err(FrameError::CorruptFrame("empty fragment".into()));
        }

        Ok(Self {
            fragment_id: fragment_id.to_string(),
            sequence_index,
            frame_count,
            fragment,
        })
    }
}

/// Keeps corrupt-frame log lines bounded when the "frame" was a scan of
/// somebody's 2 KB vCard. Counts characters, not bytes — scanned junk is
/// not guaranteed to split cleanly on byte boundaries.
fn truncate_for_log(s: &str) -> String {
    if s.chars().count() > 32 {
        let head: String = s.chars().take(32).collect();
        format!("{}…", head)
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// The result of encoding a payload into frames.
#[derive(Debug, Clone)]
pub struct FrameSet {
    /// Frames in sequence order.
    pub frames: Vec<QrFrame>,
    /// `false` for single-frame payloads — the display side can show one
    /// static code instead of an animation.
    pub is_animated: bool,
    /// Playback rate hint for animated sets, in frames per second.
    pub frame_rate_hz: u32,
}

impl FrameSet {
    /// The shared fragment id of this set.
    pub fn fragment_id(&self) -> &str {
        &self.frames[0].fragment_id
    }

    /// The frames rendered as QR text lines, in sequence order. This is
    /// what the QR rendering collaborator consumes.
    pub fn texts(&self) -> Vec<String> {
        self.frames.iter().map(QrFrame::to_text).collect()
    }
}

/// Derives the content-derived fragment id for a payload.
pub fn fragment_id(payload: &[u8]) -> String {
    let digest = domain_separated_hash(FRAGMENT_ID_CONTEXT, payload);
    hex::encode(&digest[..config::FRAGMENT_ID_LENGTH / 2])
}

/// Encodes a payload into a [`FrameSet`].
///
/// Pure function: same payload and capacity, same frames, every time.
///
/// # Errors
///
/// `InvalidInput` for an empty payload, a zero capacity, or a payload
/// that would need more than [`config::MAX_FRAME_COUNT`] frames.
pub fn encode_payload(payload: &[u8], max_frame_capacity: usize) -> Result<FrameSet, FrameError> {
    if payload.is_empty() {
        return Err(FrameError::InvalidInput("payload is empty".into()));
    }
    if max_frame_capacity == 0 {
        return Err(FrameError::InvalidInput("frame capacity must be >= 1".into()));
    }

    let frame_count = payload.len().div_ceil(max_frame_capacity);
    if frame_count > config::MAX_FRAME_COUNT {
        return Err(FrameError::InvalidInput(format!(
            "payload of {} bytes needs {} frames (limit {})",
            payload.len(),
            frame_count,
            config::MAX_FRAME_COUNT
        )));
    }

    let id = fragment_id(payload);
    let frames: Vec<QrFrame> = payload
        .chunks(max_frame_capacity)
        .enumerate()
        .map(|(i, chunk)| QrFrame {
            fragment_id: id.clone(),
            sequence_index: i as u32,
            frame_count: frame_count as u32,
            fragment: chunk.to_vec(),
        })
        .collect();

    debug!(
        fragment_id = %id,
        frames = frames.len(),
        bytes = payload.len(),
        "encoded payload into frames"
    );

    Ok(FrameSet {
        is_animated: frames.len() > 1,
        frame_rate_hz: config::FRAME_RATE_HZ,
        frames,
    })
}

// ---------------------------------------------------------------------------
// Reassembly
// ---------------------------------------------------------------------------

/// Outcome of feeding one frame to the reassembly buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// More frames are needed. `received`/`total` are suitable for a
    /// progress indicator.
    Incomplete {
        /// Distinct indices observed so far.
        received: u32,
        /// Frames in the payload.
        total: u32,
    },
    /// The last missing index arrived; here is the whole payload.
    /// Returned exactly once per payload.
    Complete(Vec<u8>),
    /// The payload was already delivered; the frame was ignored.
    AlreadyComplete,
}

/// The scanning side's accumulator. One per flow session.
///
/// Holds fragments for at most one fragment id at a time. A frame with a
/// different id supersedes the current accumulation entirely — the old
/// fragments are dropped, not merged, because mixing fragments of two
/// payloads produces garbage that may even parse.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    /// Id of the payload currently being accumulated, if any.
    fragment_id: Option<String>,
    /// Frame count declared by the first accepted frame of this id.
    frame_count: u32,
    /// Fragments by sequence index. BTreeMap so completion can walk them
    /// in index order without a sort.
    fragments: BTreeMap<u32, Vec<u8>>,
    /// Set when `Complete` has been returned for the current id.
    delivered: bool,
}

impl ReassemblyBuffer {
    /// A fresh, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a scanned text line and feeds it to the buffer.
    ///
    /// `CorruptFrame` comes back as an error so the caller can count or
    /// log it; the buffer itself is unchanged by corrupt input.
    pub fn accept_text(&mut self, text: &str) -> Result<DecodeOutcome, FrameError> {
        let frame = QrFrame::from_text(text)?;
        Ok(self.accept(&frame))
    }

    /// Feeds one structurally valid frame to the buffer.
    pub fn accept(&mut self, frame: &QrFrame) -> DecodeOutcome {
        // A frame for a different payload restarts the buffer. This is the
        // stale-scan defense: whatever we were collecting is abandoned.
        if self.fragment_id.as_deref() != Some(frame.fragment_id.as_str()) {
            if self.fragment_id.is_some() {
                debug!(
                    old = self.fragment_id.as_deref().unwrap_or_default(),
                    new = %frame.fragment_id,
                    "new fragment id observed, restarting reassembly"
                );
            }
            self.fragment_id = Some(frame.fragment_id.clone());
            self.frame_count = frame.frame_count;
            self.fragments.clear();
            self.delivered = false;
        }

        if self.delivered {
            return DecodeOutcome::AlreadyComplete;
        }

        // All frames of one id must agree on the count. A disagreeing
        // frame is lying about something; drop it rather than guess.
        if frame.frame_count != self.frame_count {
            warn!(
                fragment_id = %frame.fragment_id,
                declared = frame.frame_count,
                expected = self.frame_count,
                "frame count mismatch within fragment id, dropping frame"
            );
            return self.incomplete();
        }

        // Duplicate indices are idempotently ignored — the display loop
        // repeats every frame forever, so duplicates are the common case.
        self.fragments
            .entry(frame.sequence_index)
            .or_insert_with(|| frame.fragment.clone());

        if self.fragments.len() as u32 == self.frame_count {
            // Coverage of [0, frame_count) is guaranteed: indices are
            // range-checked at parse time and the map is deduplicated.
            let payload: Vec<u8> = std::mem::take(&mut self.fragments)
                .into_values()
                .flatten()
                .collect();
            self.delivered = true;
            debug!(
                fragment_id = self.fragment_id.as_deref().unwrap_or_default(),
                bytes = payload.len(),
                "payload reassembled"
            );
            return DecodeOutcome::Complete(payload);
        }

        self.incomplete()
    }

    /// Discards all accumulated state.
    pub fn reset(&mut self) {
        self.fragment_id = None;
        self.frame_count = 0;
        self.fragments.clear();
        self.delivered = false;
    }

    /// Distinct indices observed for the current payload.
    pub fn received(&self) -> u32 {
        self.fragments.len() as u32
    }

    /// `true` once the current payload has been delivered.
    pub fn is_complete(&self) -> bool {
        self.delivered
    }

    fn incomplete(&self) -> DecodeOutcome {
        DecodeOutcome::Incomplete {
            received: self.fragments.len() as u32,
            total: self.frame_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn small_payload_single_static_frame() {
        // 50 bytes into 200-byte frames: one frame, not animated.
        let data = payload(50);
        let set = encode_payload(&data, 200).unwrap();

        assert_eq!(set.frames.len(), 1);
        assert!(!set.is_animated);
        assert_eq!(set.frames[0].sequence_index, 0);
        assert_eq!(set.frames[0].frame_count, 1);

        let mut buf = ReassemblyBuffer::new();
        match buf.accept(&set.frames[0]) {
            DecodeOutcome::Complete(got) => assert_eq!(got, data),
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn large_payload_reassembles_in_reverse_order() {
        // 1000 bytes into 300-byte frames: 4 frames, animated; decoding
        // them back-to-front must still produce the original payload.
        let data = payload(1000);
        let set = encode_payload(&data, 300).unwrap();

        assert_eq!(set.frames.len(), 4);
        assert!(set.is_animated);
        assert!(set.frame_rate_hz > 0);

        let mut buf = ReassemblyBuffer::new();
        let mut result = None;
        for frame in set.frames.iter().rev() {
            if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                result = Some(p);
            }
        }
        assert_eq!(result.unwrap(), data);
    }

    #[test]
    fn roundtrip_with_duplicates_and_shuffled_order() {
        let data = payload(2_500);
        let set = encode_payload(&data, 128).unwrap();

        // Interleave every frame twice in a scrambled order, via the text
        // form, the way a real camera session delivers them.
        let mut order: Vec<&QrFrame> = set.frames.iter().chain(set.frames.iter()).collect();
        order.reverse();
        order.swap(0, 7);
        order.swap(3, 11);

        let mut buf = ReassemblyBuffer::new();
        let mut completions = 0;
        let mut result = None;
        for frame in order {
            match buf.accept_text(&frame.to_text()).unwrap() {
                DecodeOutcome::Complete(p) => {
                    completions += 1;
                    result = Some(p);
                }
                DecodeOutcome::Incomplete { .. } | DecodeOutcome::AlreadyComplete => {}
            }
        }

        assert_eq!(completions, 1, "Complete must fire exactly once");
        assert_eq!(result.unwrap(), data);
    }

    #[test]
    fn frames_after_completion_are_ignored() {
        let data = payload(10);
        let set = encode_payload(&data, 4).unwrap();

        let mut buf = ReassemblyBuffer::new();
        for frame in &set.frames {
            buf.accept(frame);
        }
        assert!(buf.is_complete());

        // Re-applying the full set neither re-delivers nor resurrects.
        for frame in &set.frames {
            assert_eq!(buf.accept(frame), DecodeOutcome::AlreadyComplete);
        }
        assert!(buf.is_complete());
    }

    #[test]
    fn new_fragment_id_restarts_buffer() {
        let first = encode_payload(&payload(600), 100).unwrap();
        let second_data = payload(601);
        let second = encode_payload(&second_data, 100).unwrap();
        assert_ne!(first.fragment_id(), second.fragment_id());

        let mut buf = ReassemblyBuffer::new();
        // Partially accumulate the first payload...
        buf.accept(&first.frames[0]);
        buf.accept(&first.frames[1]);
        assert_eq!(buf.received(), 2);

        // ...then a frame from a different payload supersedes it.
        buf.accept(&second.frames[0]);
        assert_eq!(buf.received(), 1);

        // The second payload completes cleanly despite the stale start.
        let mut result = None;
        for frame in &second.frames[1..] {
            if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                result = Some(p);
            }
        }
        assert_eq!(result.unwrap(), second_data);
    }

    #[test]
    fn restart_works_even_after_completion() {
        let first_data = payload(12);
        let first = encode_payload(&first_data, 4).unwrap();
        let second_data = payload(13);
        let second = encode_payload(&second_data, 4).unwrap();

        let mut buf = ReassemblyBuffer::new();
        for frame in &first.frames {
            buf.accept(frame);
        }
        assert!(buf.is_complete());

        let mut result = None;
        for frame in &second.frames {
            if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                result = Some(p);
            }
        }
        assert_eq!(result.unwrap(), second_data);
    }

    #[test]
    fn capacity_one_roundtrip() {
        let data = payload(16);
        let set = encode_payload(&data, 1).unwrap();
        assert_eq!(set.frames.len(), 16);

        let mut buf = ReassemblyBuffer::new();
        let mut result = None;
        for frame in &set.frames {
            if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                result = Some(p);
            }
        }
        assert_eq!(result.unwrap(), data);
    }

    #[test]
    fn exact_multiple_of_capacity() {
        // 900 bytes at 300/frame: exactly 3 full frames, no runt.
        let data = payload(900);
        let set = encode_payload(&data, 300).unwrap();
        assert_eq!(set.frames.len(), 3);
        assert!(set.frames.iter().all(|f| f.fragment.len() == 300));
    }

    #[test]
    fn encode_rejects_bad_input() {
        assert!(matches!(
            encode_payload(&[], 100),
            Err(FrameError::InvalidInput(_))
        ));
        assert!(matches!(
            encode_payload(b"data", 0),
            Err(FrameError::InvalidInput(_))
        ));
        // One byte per frame over the frame-count bound.
        let oversized = payload(config::MAX_FRAME_COUNT + 1);
        assert!(matches!(
            encode_payload(&oversized, 1),
            Err(FrameError::InvalidInput(_))
        ));
    }

    #[test]
    fn fragment_id_is_content_derived() {
        let a = encode_payload(&payload(500), 100).unwrap();
        let b = encode_payload(&payload(500), 100).unwrap();
        let c = encode_payload(&payload(501), 100).unwrap();

        // Same payload → same id (idempotent re-encode); different payload
        // → different id.
        assert_eq!(a.fragment_id(), b.fragment_id());
        assert_ne!(a.fragment_id(), c.fragment_id());
        assert_eq!(a.fragment_id().len(), config::FRAGMENT_ID_LENGTH);
    }

    #[test]
    fn frame_text_roundtrip() {
        let set = encode_payload(&payload(700), 250).unwrap();
        for frame in &set.frames {
            let parsed = QrFrame::from_text(&frame.to_text()).unwrap();
            assert_eq!(&parsed, frame);
        }
    }

    #[test]
    fn corrupt_lines_are_rejected_not_panicked() {
        let cases: &[&str] = &[
            "",
            "hello world",
            "https://example.com/menu",                      // someone scanned the wrong QR
            "LMQR1",                                         // prefix only
            "LMQR1:abcd:0:1:3vQB",                           // short fragment id
            "LMQR1:0123456789abcdef",                        // missing fields
            "LMQR1:0123456789abcdef:x:4:3vQB",               // non-numeric index
            "LMQR1:0123456789abcdef:4:4:3vQB",               // index == count
            "LMQR1:0123456789abcdef:0:0:3vQB",               // zero count
            "LMQR1:0123456789abcdef:0:1:not!base58!",        // bad armor
            "LMQR1:0123456789abcdef:0:1:",                   // empty fragment
            "LMQR0:0123456789abcdef:0:1:3vQB",               // wrong version prefix
            "LMQR1:01234567g9abcdef:0:1:3vQB",               // non-hex id
            "メニューはこちらです。本日のおすすめは焼き魚定食です。", // multibyte junk
        ];
        for case in cases {
            assert!(
                matches!(QrFrame::from_text(case), Err(FrameError::CorruptFrame(_))),
                "should reject: {:?}",
                case
            );
        }
    }

    #[test]
    fn corrupt_text_leaves_buffer_untouched() {
        let set = encode_payload(&payload(600), 200).unwrap();
        let mut buf = ReassemblyBuffer::new();
        buf.accept(&set.frames[0]);

        assert!(buf.accept_text("garbage from a menu QR").is_err());
        assert_eq!(buf.received(), 1, "corrupt input must not disturb state");

        // Scanning continues and still completes.
        let mut result = None;
        for frame in &set.frames[1..] {
            if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                result = Some(p);
            }
        }
        assert!(result.is_some());
    }

    #[test]
    fn frame_count_mismatch_is_dropped() {
        let set = encode_payload(&payload(600), 200).unwrap();
        let mut buf = ReassemblyBuffer::new();
        buf.accept(&set.frames[0]);

        // Same fragment id, inconsistent declared count.
        let mut liar = set.frames[1].clone();
        liar.frame_count = 7;
        liar.sequence_index = 5;
        buf.accept(&liar);
        assert_eq!(buf.received(), 1, "inconsistent frame must be dropped");
    }

    #[test]
    fn reset_clears_everything() {
        let set = encode_payload(&payload(600), 200).unwrap();
        let mut buf = ReassemblyBuffer::new();
        buf.accept(&set.frames[0]);
        buf.reset();
        assert_eq!(buf.received(), 0);
        assert!(!buf.is_complete());
    }

    #[test]
    fn incomplete_reports_progress() {
        let set = encode_payload(&payload(1000), 300).unwrap();
        let mut buf = ReassemblyBuffer::new();
        match buf.accept(&set.frames[2]) {
            DecodeOutcome::Incomplete { received, total } => {
                assert_eq!(received, 1);
                assert_eq!(total, 4);
            }
            other => panic!("expected Incomplete, got {:?}", other),
        }
    }
}
