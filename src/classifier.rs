//! Pure mapping from a [`SendpayResult`] to the controller's next move
//! (§4.3). Kept free of any I/O or state so it's exhaustively testable
//! as a `match`.

use crate::error::{AttemptCounters, PayError};
use crate::model::{Bytes32, FailCode, SendpayErrorCode, SendpayResult};

/// How the controller should retry, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Re-enter `getroute` immediately.
    Immediate,
    /// Wait out the configured retry delay, then re-enter `getroute`.
    Delayed,
}

/// The classifier's verdict on a completed sendpay attempt.
#[derive(Debug)]
pub enum SendpayOutcome {
    Success(Bytes32),
    Retry(RetryMode),
    Report(Box<PayError>),
}

/// Classifies a sendpay result (§4.3). `tries` supplies the attempt
/// counters for the `IN_PROGRESS`/`RHASH_ALREADY_USED`/
/// `DESTINATION_PERM_FAIL` report payloads.
///
/// # Panics
/// Panics if `result.error_code` is `UnparseableOnion`: per §4.1/§4.3,
/// this code can never be a legitimate sendpay terminal outcome, and
/// its arrival here is a contract violation by the send collaborator
/// that this crate does not attempt to recover from.
pub fn classify(result: SendpayResult, tries: AttemptCounters) -> SendpayOutcome {
    if result.succeeded {
        let preimage = result
            .preimage
            .expect("succeeded sendpay result must carry a preimage");
        return SendpayOutcome::Success(preimage);
    }

    match result
        .error_code
        .expect("failed sendpay result must carry an error_code")
    {
        SendpayErrorCode::InProgress => {
            SendpayOutcome::Report(Box::new(PayError::InProgress { tries }))
        }
        SendpayErrorCode::RhashAlreadyUsed => {
            SendpayOutcome::Report(Box::new(PayError::RhashAlreadyUsed { tries }))
        }
        SendpayErrorCode::DestinationPermFail => {
            let failure = result
                .routing_failure
                .expect("DESTINATION_PERM_FAIL must carry a routing_failure");
            SendpayOutcome::Report(Box::new(PayError::from_routing_failure(tries, failure)))
        }
        SendpayErrorCode::UnparseableOnion => panic!(
            "sendpay collaborator contract violation: UNPARSEABLE_ONION reached the \
             classifier as a terminal outcome ({})",
            result.details
        ),
        SendpayErrorCode::TryOtherRoute => {
            let delayed = result
                .routing_failure
                .map(|f| f.failcode.is_height_disagreement())
                .unwrap_or(false);
            SendpayOutcome::Retry(if delayed {
                RetryMode::Delayed
            } else {
                RetryMode::Immediate
            })
        }
    }
}
