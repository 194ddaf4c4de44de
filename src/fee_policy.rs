//! Fee ceiling evaluation (§4.2): decides whether a proposed route's
//! fee is acceptable, fatally too expensive, or worth retrying for at
//! lower fuzz.

use crate::model::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeDecision {
    Accept,
    RejectFatal,
    RejectRetry,
}

/// The fee (msat) and percentage computed for a route, kept alongside
/// the decision so the caller can build a `ROUTE_TOO_EXPENSIVE` payload
/// without recomputing them.
#[derive(Debug, Clone, Copy)]
pub struct FeeEvaluation {
    pub decision: FeeDecision,
    pub fee_msat: u64,
    pub fee_percent: f64,
}

/// Evaluates a non-empty route's fee against `max_fee_percent`, given
/// the current `fuzz` (§4.2). Computes `fee_percent` as `f64`, which
/// keeps the comparison exact to well beyond the 6 significant digits
/// the spec requires for `msatoshi <= 2^32 - 1`.
///
/// # Panics
/// Panics if `route` is empty or `msatoshi` is zero -- both are
/// preconditions the caller (the retry controller) must already have
/// established before evaluating fees.
pub fn evaluate(route: &Route, msatoshi: u64, max_fee_percent: f64, fuzz: f64) -> FeeEvaluation {
    assert!(msatoshi > 0, "msatoshi must be non-zero");
    let first_hop_amount = route
        .first_hop_amount_msat()
        .expect("fee policy requires a non-empty route");

    let fee_msat = first_hop_amount.saturating_sub(msatoshi);
    let fee_percent = 100.0 * (fee_msat as f64) / (msatoshi as f64);
    let too_high = fee_percent > max_fee_percent;

    let decision = if too_high && fuzz < crate::model::FUZZ_EXHAUSTED_THRESHOLD {
        FeeDecision::RejectFatal
    } else if too_high {
        FeeDecision::RejectRetry
    } else {
        FeeDecision::Accept
    };

    FeeEvaluation {
        decision,
        fee_msat,
        fee_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteHop;
    use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};

    fn dummy_pubkey() -> PublicKey {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[0x11; 32]).unwrap();
        PublicKey::from_secret_key(&secp, &sk)
    }

    fn route_with_first_hop_amount(amount_msat: u64) -> Route {
        Route {
            hops: vec![RouteHop {
                channel_id: 1,
                next_node_id: dummy_pubkey(),
                amount_msat,
                cltv_delay: 40,
            }],
        }
    }

    #[test]
    fn accepts_fee_under_ceiling() {
        // 40 msat fee on 10000 msatoshi = 0.4%, under 0.5% ceiling.
        let route = route_with_first_hop_amount(10_040);
        let eval = evaluate(&route, 10_000, 0.5, 0.75);
        assert_eq!(eval.decision, FeeDecision::Accept);
        assert_eq!(eval.fee_msat, 40);
    }

    #[test]
    fn rejects_retry_when_fuzz_remains() {
        // 100 msat fee on 10000 msatoshi = 1.0%, over 0.5% ceiling.
        let route = route_with_first_hop_amount(10_100);
        let eval = evaluate(&route, 10_000, 0.5, 0.60);
        assert_eq!(eval.decision, FeeDecision::RejectRetry);
        assert!((eval.fee_percent - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_fatal_when_fuzz_exhausted() {
        let route = route_with_first_hop_amount(10_100);
        let eval = evaluate(&route, 10_000, 0.5, 0.0);
        assert_eq!(eval.decision, FeeDecision::RejectFatal);
    }

    #[test]
    fn boundary_fee_is_accepted() {
        // Exactly at the ceiling should not be "too high".
        let route = route_with_first_hop_amount(10_050);
        let eval = evaluate(&route, 10_000, 0.5, 0.75);
        assert_eq!(eval.decision, FeeDecision::Accept);
    }
}
