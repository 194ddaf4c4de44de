//! The `pay` command entry point (§6): synchronous input validation
//! plus construction of the [`crate::model::PaymentContext`] and
//! [`crate::controller::RetryController`] that actually drives the
//! payment. BOLT11 decoding itself is an external collaborator's job
//! (§1) -- this layer accepts an already-decoded invoice and performs
//! only the cross-validation assigned to it (amount presence/absence,
//! description-hash requirement, `maxfeepercent` range).

use std::sync::Arc;
use std::time::SystemTime;

use bitcoin::secp256k1::PublicKey;
use lightning_invoice::Bolt11Invoice;
use serde_json::Value;

use crate::clock::Clock;
use crate::collaborators::{PaymentSender, RouteFinder};
use crate::config::PayConfig;
use crate::controller::RetryController;
use crate::error::PayError;
use crate::formatter::{failure_to_json, SuccessReply};
use crate::model::{Bytes32, PaymentContext};

/// Raw `pay` JSON-RPC arguments, prior to cross-validation (§6).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PayRequest {
    pub bolt11: String,
    pub msatoshi: Option<u64>,
    pub description: Option<String>,
    pub riskfactor: Option<f64>,
    pub maxfeepercent: Option<f64>,
}

/// The cross-validated, numeric outcome of stratum-1 checks: the
/// resolved `msatoshi`, `maxfeepercent`, and scaled `riskfactor`. Split
/// out from [`validate`] so these rules are testable without building
/// a real decoded invoice.
fn cross_validate(
    invoice_amount_msat: Option<u64>,
    request_msatoshi: Option<u64>,
    invoice_has_description_hash: bool,
    request_description: Option<&str>,
    request_maxfeepercent: Option<f64>,
    request_riskfactor: Option<f64>,
    config: &PayConfig,
) -> Result<(u64, f64, u32), PayError> {
    let msatoshi = match (invoice_amount_msat, request_msatoshi) {
        (Some(_), Some(_)) => {
            return Err(PayError::Input(
                "msatoshi is forbidden when the invoice already specifies an amount".into(),
            ));
        }
        (None, None) => {
            return Err(PayError::Input(
                "msatoshi is required because the invoice omits an amount".into(),
            ));
        }
        (Some(amount), None) => amount,
        (None, Some(amount)) => amount,
    };
    if msatoshi == 0 {
        return Err(PayError::Input("msatoshi must be non-zero".into()));
    }
    if msatoshi > u32::MAX as u64 {
        return Err(PayError::Input(format!(
            "msatoshi must be <= {}, got {msatoshi}",
            u32::MAX
        )));
    }

    if invoice_has_description_hash && request_description.is_none() {
        return Err(PayError::Input(
            "description is required because the invoice carries a description hash".into(),
        ));
    }

    let maxfeepercent = request_maxfeepercent.unwrap_or(config.default_max_fee_percent);
    if !(0.0..=100.0).contains(&maxfeepercent) {
        return Err(PayError::Input(format!(
            "maxfeepercent must be within [0.0, 100.0], got {maxfeepercent}"
        )));
    }

    let riskfactor = request_riskfactor.unwrap_or(config.default_riskfactor);
    if riskfactor < 0.0 {
        return Err(PayError::Input(format!(
            "riskfactor must be non-negative, got {riskfactor}"
        )));
    }
    let riskfactor_scaled = (riskfactor * 1000.0).round() as u32;

    Ok((msatoshi, maxfeepercent, riskfactor_scaled))
}

/// Validates a [`PayRequest`] against its already-decoded invoice and
/// this orchestrator's config, producing a ready-to-run
/// [`PaymentContext`]. Returns `Err(PayError::Input(..))` for every
/// stratum-1 failure in §7; the Payment Context is never constructed
/// in that case.
pub fn validate(
    request: &PayRequest,
    invoice: &Bolt11Invoice,
    config: &PayConfig,
) -> Result<PaymentContext, PayError> {
    let (msatoshi, maxfeepercent, riskfactor_scaled) = cross_validate(
        invoice.amount_milli_satoshis(),
        request.msatoshi,
        invoice.description_hash().is_some(),
        request.description.as_deref(),
        request.maxfeepercent,
        request.riskfactor,
        config,
    )?;

    let payment_hash = Bytes32(*invoice.payment_hash().as_ref());
    let receiver_id = *invoice.recover_payee_pub_key();
    let expiry = invoice
        .expires_at()
        .map(|d| SystemTime::UNIX_EPOCH + d)
        .unwrap_or(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(u64::MAX / 2));
    let min_final_cltv_expiry = invoice.min_final_cltv_expiry_delta() as u32;

    Ok(PaymentContext::new(
        payment_hash,
        receiver_id,
        expiry,
        min_final_cltv_expiry,
        msatoshi,
        riskfactor_scaled,
        maxfeepercent,
    ))
}

/// Runs the full `pay` command: validate, build a controller, drive it
/// to completion, and render the wire JSON reply (§4.6).
pub async fn pay(
    request: PayRequest,
    invoice: &Bolt11Invoice,
    self_id: PublicKey,
    route_finder: Arc<dyn RouteFinder>,
    payment_sender: Arc<dyn PaymentSender>,
    clock: Arc<dyn Clock>,
    config: PayConfig,
) -> Value {
    let ctx = match validate(&request, invoice, &config) {
        Ok(ctx) => ctx,
        Err(err) => return failure_to_json(&err),
    };

    let controller =
        RetryController::new(self_id, ctx, route_finder, payment_sender, clock, config);
    match controller.start().await {
        Ok(reply) => success_to_json(&reply),
        Err(err) => failure_to_json(&err),
    }
}

fn success_to_json(reply: &SuccessReply) -> Value {
    reply.to_json()
}
