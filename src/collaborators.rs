//! The external collaborators this crate consumes (§1, §4.5): the
//! gossip/routing daemon that answers `getroute`, and the low-level
//! payment-send subsystem that dispatches onions and reports
//! `sendpay` outcomes. Both are out of scope to *implement* -- this
//! module only fixes the Rust-side request/reply shapes and the trait
//! seam the controller calls through, following the same
//! fake-the-collaborator-for-tests pattern the corpus uses for its
//! `PaymentService`/`Router` traits.

use async_trait::async_trait;
use bitcoin::secp256k1::PublicKey;

use crate::model::{Bytes32, Route, SendpayResult};

/// A route request to the gossip collaborator (§4.5).
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub sender_id: PublicKey,
    pub receiver_id: PublicKey,
    pub amount_msat: u64,
    pub riskfactor_scaled: u32,
    pub min_final_cltv_expiry: u32,
    pub fuzz: f64,
    /// Fresh per-attempt seed so fuzzing is unpredictable across
    /// retries (§4.5); drawn from `rand` by the controller.
    pub seed: u64,
}

/// Finds routes through the gossip-maintained channel graph.
#[async_trait]
pub trait RouteFinder: Send + Sync {
    /// Returns a possibly-empty route; an empty route means "no path
    /// found" (§4.1's `RouteNotFound` transition), not an error.
    async fn get_route(&self, request: RouteRequest) -> anyhow::Result<Route>;
}

/// A send request to the payment-send collaborator (§4.5).
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub payment_hash: Bytes32,
    pub route: Route,
}

/// Dispatches payments and reports their terminal outcome.
#[async_trait]
pub trait PaymentSender: Send + Sync {
    async fn send_payment(&self, request: SendRequest) -> anyhow::Result<SendpayResult>;
}
