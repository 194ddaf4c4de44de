//! Property tests for the quantified invariants in SPEC_FULL.md §8,
//! distinct from the fixed end-to-end scenarios in
//! `tests/integration_test.rs`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use proptest::prelude::*;

use payroute_engine::clock::test_util::TestClock;
use payroute_engine::collaborators::{PaymentSender, RouteFinder, RouteRequest, SendRequest};
use payroute_engine::config::PayConfig;
use payroute_engine::model::{Bytes32, PaymentContext, Route, RouteHop, SendpayErrorCode, SendpayResult};
use payroute_engine::RetryController;

fn pubkey(byte: u8) -> PublicKey {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[byte.max(1); 32]).unwrap();
    PublicKey::from_secret_key(&secp, &sk)
}

fn context(msatoshi: u64, clock: &TestClock) -> PaymentContext {
    PaymentContext::new(
        Bytes32([0xcd; 32]),
        pubkey(9),
        clock.now() + Duration::from_secs(3600),
        40,
        msatoshi,
        1000,
        0.5,
    )
}

/// A route finder that rejects on fee for the first `fee_too_high_count`
/// calls (fee far over the ceiling, but not enough to exhaust fuzz for
/// the small counts this test uses), then accepts every call after.
struct CountedFeeRouteFinder {
    fee_too_high_count: u32,
    calls: Mutex<u32>,
}

#[async_trait]
impl RouteFinder for CountedFeeRouteFinder {
    async fn get_route(&self, request: RouteRequest) -> anyhow::Result<Route> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        let fee_msat = if *calls <= self.fee_too_high_count {
            1_000 // 10% fee on 10_000 msatoshi, over the 0.5% ceiling
        } else {
            0
        };
        Ok(Route {
            hops: vec![RouteHop {
                channel_id: 1,
                next_node_id: pubkey(2),
                amount_msat: request.amount_msat + fee_msat,
                cltv_delay: 40,
            }],
        })
    }
}

/// A payment sender that returns `TRY_OTHER_ROUTE` (immediate retry)
/// `immediate_retries` times, then succeeds with `preimage`.
struct CountedRetryPaymentSender {
    immediate_retries: u32,
    preimage: Bytes32,
    calls: Mutex<u32>,
}

#[async_trait]
impl PaymentSender for CountedRetryPaymentSender {
    async fn send_payment(&self, _request: SendRequest) -> anyhow::Result<SendpayResult> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls <= self.immediate_retries {
            Ok(SendpayResult::failure(
                SendpayErrorCode::TryOtherRoute,
                "no path",
            ))
        } else {
            Ok(SendpayResult::success(self.preimage))
        }
    }
}

proptest! {
    /// §8: "For every execution, `getroute_tries >= sendpay_tries`."
    /// and: "For any sequence of collaborator replies that culminates
    /// in success, the final reply's `payment_preimage` equals the
    /// preimage delivered by the send collaborator."
    #[test]
    fn getroute_tries_never_below_sendpay_tries_and_preimage_round_trips(
        fee_too_high_count in 0u32..=3,
        immediate_retries in 0u32..=3,
        preimage_byte in any::<u8>(),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let clock = Arc::new(TestClock::new(SystemTime::now()));
        let ctx = context(10_000, &clock);
        let preimage = Bytes32([preimage_byte; 32]);

        let controller = RetryController::new(
            pubkey(1),
            ctx,
            Arc::new(CountedFeeRouteFinder {
                fee_too_high_count,
                calls: Mutex::new(0),
            }),
            Arc::new(CountedRetryPaymentSender {
                immediate_retries,
                preimage,
                calls: Mutex::new(0),
            }),
            clock,
            PayConfig::default(),
        );

        let reply = runtime.block_on(controller.start()).expect("script always succeeds eventually");

        prop_assert!(reply.getroute_tries >= reply.sendpay_tries);
        prop_assert_eq!(reply.getroute_tries, fee_too_high_count + immediate_retries + 1);
        prop_assert_eq!(reply.sendpay_tries, immediate_retries + 1);
        prop_assert_eq!(reply.payment_preimage, preimage.to_hex());
    }
}
