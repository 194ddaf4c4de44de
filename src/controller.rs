//! Retry Controller / state machine (§4.1): the orchestrator proper.
//!
//! Drives `Idle → AwaitingRoute → AwaitingSend → {Done, Retry, Delay}`
//! as a single `async fn`, matching §5's single-threaded cooperative
//! model -- every suspension point is an explicit `.await` against a
//! collaborator trait, and nothing here needs a lock.

use std::sync::Arc;

use bitcoin::secp256k1::PublicKey;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::arena::AttemptArena;
use crate::classifier::{classify, RetryMode, SendpayOutcome};
use crate::clock::Clock;
use crate::collaborators::{PaymentSender, RouteFinder, RouteRequest, SendRequest};
use crate::config::PayConfig;
use crate::error::{AttemptCounters, PayError};
use crate::fee_policy::{self, FeeDecision};
use crate::formatter::SuccessReply;
use crate::model::PaymentContext;

/// Drives one [`PaymentContext`] to completion (§4.1's single public
/// operation, `start`). Built fresh per outstanding `pay` command.
pub struct RetryController {
    self_id: PublicKey,
    ctx: PaymentContext,
    arena: AttemptArena,
    route_finder: Arc<dyn RouteFinder>,
    payment_sender: Arc<dyn PaymentSender>,
    clock: Arc<dyn Clock>,
    config: PayConfig,
}

impl RetryController {
    pub fn new(
        self_id: PublicKey,
        ctx: PaymentContext,
        route_finder: Arc<dyn RouteFinder>,
        payment_sender: Arc<dyn PaymentSender>,
        clock: Arc<dyn Clock>,
        config: PayConfig,
    ) -> Self {
        Self {
            self_id,
            ctx,
            arena: AttemptArena::new(0),
            route_finder,
            payment_sender,
            clock,
            config,
        }
    }

    fn tries(&self) -> AttemptCounters {
        AttemptCounters {
            getroute_tries: self.ctx.getroute_tries,
            sendpay_tries: self.ctx.sendpay_tries,
        }
    }

    /// Runs the state machine to completion. Returns `Ok` on success,
    /// `Err(PayError)` on any terminal failure (policy failure or a
    /// wrapped collaborator error per §7). Dropping this future before
    /// it resolves is this crate's cancellation mechanism (§5): nothing
    /// is left pending and no terminal reply is emitted.
    #[instrument(skip(self), fields(payment_hash = %self.ctx.payment_hash.to_hex()))]
    pub async fn start(mut self) -> Result<SuccessReply, PayError> {
        // Set only on the AwaitingSend-immediate-retry continue below; tells
        // the top of the next iteration to keep the current arena instead of
        // releasing it for a fresh one (§4.4's one exception to replacement).
        let mut keep_arena = false;
        loop {
            // Idle -> AwaitingRoute, or -> Done(Expired).
            if self.clock.now() >= self.ctx.expiry {
                warn!(tries = ?self.tries(), "invoice expired before next attempt");
                return Err(PayError::InvoiceExpired {
                    now: self.clock.now(),
                    expiry: self.ctx.expiry,
                    tries: self.tries(),
                });
            }
            if let Some(max) = self.config.max_attempts {
                if self.ctx.getroute_tries >= max {
                    warn!(tries = ?self.tries(), "max_attempts reached");
                    return Err(PayError::RouteNotFound {
                        tries: self.tries(),
                    });
                }
            }

            if keep_arena {
                keep_arena = false;
            } else {
                self.arena = AttemptArena::new(self.ctx.getroute_tries + 1);
            }
            self.ctx.getroute_tries += 1;
            info!(getroute_tries = self.ctx.getroute_tries, "requesting route");

            let route = self
                .route_finder
                .get_route(self.route_request())
                .await
                .map_err(|e| PayError::Internal(e.to_string()))?;

            if route.is_empty() {
                return Err(PayError::RouteNotFound {
                    tries: self.tries(),
                });
            }
            self.arena.store_route(route.clone());

            let eval = fee_policy::evaluate(
                &route,
                self.ctx.msatoshi,
                self.ctx.max_fee_percent,
                self.ctx.fuzz,
            );
            match eval.decision {
                FeeDecision::RejectFatal => {
                    return Err(PayError::RouteTooExpensive {
                        fee: eval.fee_msat,
                        feepercent: eval.fee_percent,
                        msatoshi: self.ctx.msatoshi,
                        maxfeepercent: self.ctx.max_fee_percent,
                        tries: self.tries(),
                    });
                }
                FeeDecision::RejectRetry => {
                    self.ctx.lower_fuzz();
                    info!(fuzz = self.ctx.fuzz, "fee too high, retrying with lower fuzz");
                    continue;
                }
                FeeDecision::Accept => {}
            }

            // AwaitingRoute -> AwaitingSend.
            self.ctx.sendpay_tries += 1;
            info!(sendpay_tries = self.ctx.sendpay_tries, "sending payment");

            let send_result = self
                .payment_sender
                .send_payment(SendRequest {
                    payment_hash: self.ctx.payment_hash,
                    route,
                })
                .await
                .map_err(|e| PayError::Internal(e.to_string()))?;

            match classify(send_result, self.tries()) {
                SendpayOutcome::Success(preimage) => {
                    info!(tries = ?self.tries(), "payment succeeded");
                    return Ok(SuccessReply {
                        payment_preimage: preimage.to_hex(),
                        getroute_tries: self.ctx.getroute_tries,
                        sendpay_tries: self.ctx.sendpay_tries,
                    });
                }
                SendpayOutcome::Report(err) => return Err(*err),
                SendpayOutcome::Retry(RetryMode::Immediate) => {
                    keep_arena = true;
                    continue;
                }
                SendpayOutcome::Retry(RetryMode::Delayed) => {
                    info!(delay = ?self.config.retry_delay, "delaying before next attempt");
                    self.clock.sleep(self.config.retry_delay).await;
                    continue;
                }
            }
        }
    }

    fn route_request(&self) -> RouteRequest {
        RouteRequest {
            sender_id: self.self_id,
            receiver_id: self.ctx.receiver_id,
            amount_msat: self.ctx.msatoshi,
            riskfactor_scaled: self.ctx.riskfactor_scaled,
            min_final_cltv_expiry: self.ctx.min_final_cltv_expiry,
            fuzz: self.ctx.fuzz,
            seed: rand::thread_rng().gen(),
        }
    }
}
