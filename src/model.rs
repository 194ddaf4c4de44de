//! Core data model: payment context, routes, and the sendpay outcome
//! taxonomy the error classifier and fee policy operate over.

use std::time::{Duration, SystemTime};

use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

/// A payment hash or preimage: 32 raw bytes, hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One hop of a proposed route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteHop {
    pub channel_id: u64,
    pub next_node_id: PublicKey,
    /// Amount forwarded *out of* this hop, in millisatoshi. The first
    /// hop's `amount_msat` is the total the sender dispatches; later
    /// hops' amounts are smaller by the intervening per-hop fees.
    pub amount_msat: u64,
    pub cltv_delay: u32,
}

/// An ordered path from us to the payee. Transient: lives only for the
/// attempt that requested it, owned by that attempt's [`crate::arena::AttemptArena`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Route {
    pub hops: Vec<RouteHop>,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Total millisatoshi the sender must dispatch for this route, i.e.
    /// the first hop's outbound amount. `None` for an empty route.
    pub fn first_hop_amount_msat(&self) -> Option<u64> {
        self.hops.first().map(|h| h.amount_msat)
    }
}

/// Onion failcodes relevant to this orchestrator's retry decisions. The
/// full onion failcode space is the sendpay collaborator's concern; we
/// only need to distinguish the height-disagreement codes from the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailCode {
    ExpiryTooFar,
    ExpiryTooSoon,
    FinalExpiryTooSoon,
    Other(u16),
}

impl FailCode {
    /// `EXPIRY_*` codes: a block-height disagreement that a short timer
    /// often resolves on its own (§4.1 of the spec).
    pub fn is_height_disagreement(self) -> bool {
        matches!(
            self,
            FailCode::ExpiryTooFar | FailCode::ExpiryTooSoon | FailCode::FinalExpiryTooSoon
        )
    }
}

/// Detail attached to an onion routing failure, as reported by the
/// sendpay collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingFailure {
    pub erring_index: u32,
    pub failcode: FailCode,
    pub erring_node: PublicKey,
    pub erring_channel: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_update: Option<Vec<u8>>,
}

/// The sendpay collaborator's error taxonomy (§3). `UnparseableOnion`
/// must never reach the classifier as a terminal outcome; see
/// [`crate::classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendpayErrorCode {
    InProgress,
    RhashAlreadyUsed,
    UnparseableOnion,
    DestinationPermFail,
    TryOtherRoute,
}

/// Raw reply from the payment-send collaborator (§3). Either `succeeded`
/// is true and `preimage` is set, or it's false and `error_code` plus
/// optional `routing_failure` describe why.
#[derive(Debug, Clone)]
pub struct SendpayResult {
    pub succeeded: bool,
    pub preimage: Option<Bytes32>,
    pub error_code: Option<SendpayErrorCode>,
    pub routing_failure: Option<RoutingFailure>,
    pub details: String,
}

impl SendpayResult {
    pub fn success(preimage: Bytes32) -> Self {
        Self {
            succeeded: true,
            preimage: Some(preimage),
            error_code: None,
            routing_failure: None,
            details: String::new(),
        }
    }

    pub fn failure(error_code: SendpayErrorCode, details: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            preimage: None,
            error_code: Some(error_code),
            routing_failure: None,
            details: details.into(),
        }
    }

    pub fn with_routing_failure(mut self, failure: RoutingFailure) -> Self {
        self.routing_failure = Some(failure);
        self
    }
}

/// Invariant payment parameters plus the mutable per-attempt counters
/// and fuzz (§3). One `PaymentContext` per outstanding `pay` command.
#[derive(Debug, Clone)]
pub struct PaymentContext {
    pub payment_hash: Bytes32,
    pub receiver_id: PublicKey,
    pub expiry: SystemTime,
    pub min_final_cltv_expiry: u32,
    pub msatoshi: u64,
    pub riskfactor_scaled: u32,
    pub max_fee_percent: f64,

    pub getroute_tries: u32,
    pub sendpay_tries: u32,
    pub fuzz: f64,
}

/// Fuzz decreases by this much on each fee-too-high retry (§3, §4.2).
pub const FUZZ_STEP: f64 = 0.15;
/// Starting fuzz for a fresh payment context.
pub const FUZZ_START: f64 = 0.75;
/// Below this, fuzz is considered exhausted and fee-too-high becomes fatal.
pub const FUZZ_EXHAUSTED_THRESHOLD: f64 = 0.01;
/// Delay before retrying after a block-height disagreement (§4.1).
/// Exposed as [`crate::config::PayConfig::retry_delay`] so it isn't
/// hardcoded -- see SPEC_FULL.md's Design Notes on the retry-delay
/// open question.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

impl PaymentContext {
    pub fn new(
        payment_hash: Bytes32,
        receiver_id: PublicKey,
        expiry: SystemTime,
        min_final_cltv_expiry: u32,
        msatoshi: u64,
        riskfactor_scaled: u32,
        max_fee_percent: f64,
    ) -> Self {
        Self {
            payment_hash,
            receiver_id,
            expiry,
            min_final_cltv_expiry,
            msatoshi,
            riskfactor_scaled,
            max_fee_percent,
            getroute_tries: 0,
            sendpay_tries: 0,
            fuzz: FUZZ_START,
        }
    }

    /// Lowers fuzz by [`FUZZ_STEP`], clamped to zero (§3 invariant:
    /// `fuzz` is monotonically non-increasing).
    pub fn lower_fuzz(&mut self) {
        self.fuzz = (self.fuzz - FUZZ_STEP).max(0.0);
    }

    pub fn fuzz_exhausted(&self) -> bool {
        self.fuzz < FUZZ_EXHAUSTED_THRESHOLD
    }
}
