//! # Response Validation
//!
//! Enforces that a scanned [`SigningResponse`] actually answers the
//! [`SigningRequest`] this wallet sent — before a single byte of
//! transaction content is inspected.
//!
//! The checks are strictly ordered and short-circuit on first failure,
//! because each one narrows the trust assumptions the next relies on:
//! a response that isn't even *ours* (id mismatch) has no business having
//! its ok-flag read, and a rejection has no business having transactions
//! counted.

use thiserror::Error;
use tracing::debug;

use super::envelope::{SigningRequest, SigningResponse};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a response fails validation against its request.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The response answers a different (or stale) request.
    #[error("response is for request {got}, expected {expected}")]
    RequestMismatch {
        /// The request id this session is waiting on.
        expected: String,
        /// The request id the response carries.
        got: String,
    },

    /// The signer declined. Carries the signer's message verbatim so the
    /// UI can show the user why.
    #[error("signing rejected: {message}")]
    SigningRejected {
        /// Machine-readable code from the signer, if it gave one.
        code: String,
        /// The signer's human-readable explanation.
        message: String,
    },

    /// The response does not contain exactly one signed transaction.
    #[error("expected exactly 1 signed transaction, response contains {count}")]
    UnexpectedTransactionCount {
        /// How many the response actually carried.
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a response against the outstanding request.
///
/// Rules, in order, short-circuiting on the first failure:
///
/// 1. **Identity** — `response.request_id` must equal
///    `request.request_id`, else [`ValidationError::RequestMismatch`].
///    A response to a superseded or foreign request is rejected here no
///    matter how valid its contents are.
/// 2. **Consent** — `response.ok` must be `true`, else
///    [`ValidationError::SigningRejected`] carrying the signer's message.
/// 3. **Exactly one transaction** — `response.signed_txns.len() == 1`,
///    else [`ValidationError::UnexpectedTransactionCount`].
///
/// Rule 3 is a security invariant, not a formality. The wallet asked for
/// a signature over one known transaction; a response smuggling a group
/// of them is precisely how a compromised signer would get an unapproved
/// transaction authorized alongside the approved one. The count check
/// runs *before* anything looks inside the transaction bytes, so
/// malicious content never gets a chance to be persuasive.
pub fn validate_response(
    response: &SigningResponse,
    request: &SigningRequest,
) -> Result<(), ValidationError> {
    // 1. The response must answer *this* request.
    if response.request_id != request.request_id {
        return Err(ValidationError::RequestMismatch {
            expected: request.request_id.clone(),
            got: response.request_id.clone(),
        });
    }

    // 2. The signer must have approved.
    if !response.ok {
        let (code, message) = match &response.err {
            Some(e) => (e.code.clone(), e.message.clone()),
            None => ("unknown".to_string(), "signer rejected the request".to_string()),
        };
        return Err(ValidationError::SigningRejected { code, message });
    }

    // 3. Exactly one signed transaction. Zero means the signer approved
    //    nothing; more than one means it signed things we never showed
    //    the user.
    if response.signed_txns.len() != 1 {
        return Err(ValidationError::UnexpectedTransactionCount {
            count: response.signed_txns.len(),
        });
    }

    debug!(request_id = %request.request_id, "response validated against request");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LumenKeypair;
    use crate::ledger::address::LumenAddress;

    fn request() -> SigningRequest {
        let target = LumenAddress::from_public_key(&LumenKeypair::generate().public_key());
        SigningRequest::new(vec![1, 2, 3], &target.to_string()).unwrap()
    }

    #[test]
    fn accepts_matching_single_transaction_response() {
        let req = request();
        let resp = SigningResponse::approved(&req.request_id, vec![vec![0xAB; 64]]);
        assert!(validate_response(&resp, &req).is_ok());
    }

    #[test]
    fn rejects_mismatched_request_id() {
        let req = request();
        let resp = SigningResponse::approved("someone-elses-request", vec![vec![0xAB; 64]]);
        match validate_response(&resp, &req) {
            Err(ValidationError::RequestMismatch { expected, got }) => {
                assert_eq!(expected, req.request_id);
                assert_eq!(got, "someone-elses-request");
            }
            other => panic!("expected RequestMismatch, got {:?}", other),
        }
    }

    #[test]
    fn identity_check_runs_before_everything_else() {
        // Even a rejection for a foreign request is reported as a
        // mismatch, not as "signing rejected" — it isn't our rejection.
        let req = request();
        let resp = SigningResponse::rejected("foreign", "declined", "User declined");
        assert!(matches!(
            validate_response(&resp, &req),
            Err(ValidationError::RequestMismatch { .. })
        ));
    }

    #[test]
    fn surfaces_signer_rejection_message() {
        let req = request();
        let resp = SigningResponse::rejected(&req.request_id, "declined", "User declined");
        match validate_response(&resp, &req) {
            Err(ValidationError::SigningRejected { message, code }) => {
                assert_eq!(message, "User declined");
                assert_eq!(code, "declined");
            }
            other => panic!("expected SigningRejected, got {:?}", other),
        }
    }

    #[test]
    fn rejection_without_detail_still_fails_closed() {
        let req = request();
        let resp = SigningResponse {
            request_id: req.request_id.clone(),
            ok: false,
            signed_txns: Vec::new(),
            err: None,
        };
        assert!(matches!(
            validate_response(&resp, &req),
            Err(ValidationError::SigningRejected { .. })
        ));
    }

    #[test]
    fn rejects_every_wrong_transaction_count() {
        let req = request();
        for count in [0usize, 2, 3, 7] {
            let resp =
                SigningResponse::approved(&req.request_id, vec![vec![0xAB; 64]; count]);
            match validate_response(&resp, &req) {
                Err(ValidationError::UnexpectedTransactionCount { count: got }) => {
                    assert_eq!(got, count)
                }
                other => panic!("expected UnexpectedTransactionCount for {}, got {:?}", count, other),
            }
        }
    }

    #[test]
    fn count_check_ignores_transaction_content() {
        // Two perfectly plausible-looking transactions are still two
        // transactions. Content must not rescue a bad count.
        let req = request();
        let resp = SigningResponse::approved(
            &req.request_id,
            vec![req.unsigned_txn.clone(), req.unsigned_txn.clone()],
        );
        assert!(matches!(
            validate_response(&resp, &req),
            Err(ValidationError::UnexpectedTransactionCount { count: 2 })
        ));
    }

    #[test]
    fn ok_check_runs_before_count_check() {
        // A rejection with a weird transaction list reports the rejection,
        // not the count.
        let req = request();
        let mut resp = SigningResponse::rejected(&req.request_id, "declined", "no");
        resp.signed_txns = vec![vec![1], vec![2]];
        assert!(matches!(
            validate_response(&resp, &req),
            Err(ValidationError::SigningRejected { .. })
        ));
    }
}
