use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use payroute_engine::clock::SystemClock;
use payroute_engine::collaborators::{PaymentSender, RouteFinder, RouteRequest, SendRequest};
use payroute_engine::model::{Route, SendpayResult};
use payroute_engine::{pay, PayConfig, PayRequest};

/// Stand-in for the gossip collaborator (§1): this crate doesn't speak
/// to a real routing daemon, so the CLI reports `ROUTE_NOT_FOUND`
/// immediately rather than fabricating a path.
struct UnconfiguredRouteFinder;

#[async_trait]
impl RouteFinder for UnconfiguredRouteFinder {
    async fn get_route(&self, _request: RouteRequest) -> Result<Route> {
        Ok(Route::default())
    }
}

struct UnconfiguredPaymentSender;

#[async_trait]
impl PaymentSender for UnconfiguredPaymentSender {
    async fn send_payment(&self, _request: SendRequest) -> Result<SendpayResult> {
        anyhow::bail!("no payment-send collaborator is wired up in this demo binary")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let bolt11 = std::env::args()
        .nth(1)
        .context("usage: payroute_cli <bolt11> [msatoshi]")?;
    let msatoshi = std::env::args().nth(2).and_then(|s| s.parse().ok());

    println!("payroute-engine demo CLI starting...");
    println!("decoding invoice (external collaborator in production)...");

    let invoice: lightning_invoice::Bolt11Invoice = bolt11
        .parse()
        .context("failed to decode bolt11 invoice")?;

    let config = PayConfig::from_env();
    config.validate().context("invalid configuration")?;

    let self_id = invoice.recover_payee_pub_key();

    let request = PayRequest {
        bolt11,
        msatoshi,
        description: None,
        riskfactor: None,
        maxfeepercent: None,
    };

    println!("dispatching payment orchestrator...");
    let reply = pay(
        request,
        &invoice,
        *self_id,
        Arc::new(UnconfiguredRouteFinder),
        Arc::new(UnconfiguredPaymentSender),
        Arc::new(SystemClock),
        config,
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&reply)?);

    Ok(())
}
