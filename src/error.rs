//! The `pay` command's wire error taxonomy (§6, §7).
//!
//! Input-validation failures and policy failures both flow through
//! `PayError`; transient failures never reach this type because the
//! controller retries them internally (§4.1). `UnparseableOnion` is the
//! one classification that must never be *returned* -- the classifier
//! panics instead, per the spec's "fail-stop" directive.

use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{FailCode, RoutingFailure};

/// Attempt counters echoed into every failure payload's `data` (§6).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct AttemptCounters {
    pub getroute_tries: u32,
    pub sendpay_tries: u32,
}

#[derive(Debug, Error)]
pub enum PayError {
    /// Stratum 1 (§7): malformed invoice, contradictory `msatoshi`,
    /// out-of-range `maxfeepercent`. Returned before any
    /// [`crate::model::PaymentContext`] is constructed.
    #[error("invalid pay request: {0}")]
    Input(String),

    #[error("invoice expired (now={now:?}, expiry={expiry:?})")]
    InvoiceExpired {
        now: std::time::SystemTime,
        expiry: std::time::SystemTime,
        tries: AttemptCounters,
    },

    #[error("no route found")]
    RouteNotFound { tries: AttemptCounters },

    #[error("route too expensive: fee {fee} msat ({feepercent:.4}% > {maxfeepercent}%)")]
    RouteTooExpensive {
        fee: u64,
        feepercent: f64,
        msatoshi: u64,
        maxfeepercent: f64,
        tries: AttemptCounters,
    },

    #[error("payment already in progress")]
    InProgress { tries: AttemptCounters },

    #[error("payment hash already used")]
    RhashAlreadyUsed { tries: AttemptCounters },

    #[error("destination permanently failed the payment")]
    DestinationPermFail {
        erring_index: u32,
        failcode: FailCode,
        erring_node: bitcoin::secp256k1::PublicKey,
        erring_channel: u64,
        channel_update: Option<Vec<u8>>,
        tries: AttemptCounters,
    },

    /// A collaborator (gossip daemon, send subsystem) returned an
    /// `anyhow::Error` rather than a well-formed reply (§7). Not part of
    /// the wire taxonomy's seven codes; wrapped generically.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PayError {
    /// The machine-readable wire code from §6's table.
    pub fn code(&self) -> &'static str {
        match self {
            PayError::Input(_) => "INVALID_ARGUMENT",
            PayError::InvoiceExpired { .. } => "INVOICE_EXPIRED",
            PayError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            PayError::RouteTooExpensive { .. } => "ROUTE_TOO_EXPENSIVE",
            PayError::InProgress { .. } => "IN_PROGRESS",
            PayError::RhashAlreadyUsed { .. } => "RHASH_ALREADY_USED",
            PayError::DestinationPermFail { .. } => "DESTINATION_PERM_FAIL",
            PayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The structured `data` object accompanying the wire error (§6).
    pub fn data(&self) -> Value {
        match self {
            PayError::Input(_) => Value::Null,
            PayError::InvoiceExpired { now, expiry, tries } => json!({
                "now": system_time_secs(*now),
                "now_iso": system_time_iso(*now),
                "expiry": system_time_secs(*expiry),
                "expiry_iso": system_time_iso(*expiry),
                "getroute_tries": tries.getroute_tries,
                "sendpay_tries": tries.sendpay_tries,
            }),
            PayError::RouteNotFound { tries } => json!({
                "getroute_tries": tries.getroute_tries,
                "sendpay_tries": tries.sendpay_tries,
            }),
            PayError::RouteTooExpensive {
                fee,
                feepercent,
                msatoshi,
                maxfeepercent,
                tries,
            } => json!({
                "fee": fee,
                "feepercent": feepercent,
                "msatoshi": msatoshi,
                "maxfeepercent": maxfeepercent,
                "getroute_tries": tries.getroute_tries,
                "sendpay_tries": tries.sendpay_tries,
            }),
            PayError::InProgress { tries } | PayError::RhashAlreadyUsed { tries } => json!({
                "getroute_tries": tries.getroute_tries,
                "sendpay_tries": tries.sendpay_tries,
            }),
            PayError::DestinationPermFail {
                erring_index,
                failcode,
                erring_node,
                erring_channel,
                channel_update,
                tries,
            } => json!({
                "erring_index": erring_index,
                "failcode": format!("{failcode:?}"),
                "erring_node": erring_node.to_string(),
                "erring_channel": erring_channel,
                "channel_update": channel_update.as_ref().map(hex::encode),
                "getroute_tries": tries.getroute_tries,
                "sendpay_tries": tries.sendpay_tries,
            }),
            PayError::Internal(_) => Value::Null,
        }
    }

    pub fn from_routing_failure(tries: AttemptCounters, f: RoutingFailure) -> Self {
        PayError::DestinationPermFail {
            erring_index: f.erring_index,
            failcode: f.failcode,
            erring_node: f.erring_node,
            erring_channel: f.erring_channel,
            channel_update: f.channel_update,
            tries,
        }
    }
}

fn system_time_secs(t: std::time::SystemTime) -> u64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Human-readable RFC3339 rendering of a wire timestamp, for operators
/// reading logs/replies without doing epoch-seconds math by hand.
fn system_time_iso(t: std::time::SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_table() {
        let tries = AttemptCounters {
            getroute_tries: 1,
            sendpay_tries: 0,
        };
        assert_eq!(
            PayError::RouteNotFound { tries }.code(),
            "ROUTE_NOT_FOUND"
        );
        assert_eq!(
            PayError::RouteTooExpensive {
                fee: 100,
                feepercent: 1.0,
                msatoshi: 10_000,
                maxfeepercent: 0.5,
                tries,
            }
            .code(),
            "ROUTE_TOO_EXPENSIVE"
        );
    }
}
