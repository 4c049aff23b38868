//! # SalaryTalk Runtime
//!
//! Wires the negotiation engine to in-memory adapters and runs one
//! negotiation: availability check, create two offers, verify one, print the dashboard.
//!
//! ## Environment Variables
//!
//! - `ST_IDENTITY`: identity the session connects as
//! - `ST_MATCH_TOLERANCE_BPS`: ledger match tolerance in basis points (default: exact)
//! - `ST_PRINT_METRICS`: print the Prometheus exposition at exit (default: false)
//! - plus everything `NegotiationConfig::from_env` and `TelemetryConfig::from_env` read

use anyhow::{Context, Result};
use st_negotiation::{
    employer_offer_display, history_outcome, short_identity, Identity, InMemoryLedger, MatchRule,
    NegotiationApi, NegotiationConfig, NegotiationEngine, OfferDraft, SimulatedFheGateway,
};
use st_telemetry::{encode_metrics, init_telemetry, PrometheusObserver, TelemetryConfig};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_IDENTITY: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";

/// Runtime settings that are not engine or telemetry configuration.
struct RuntimeConfig {
    identity: Identity,
    match_rule: MatchRule,
    print_metrics: bool,
}

fn load_config() -> RuntimeConfig {
    let identity = std::env::var("ST_IDENTITY").unwrap_or_else(|_| DEFAULT_IDENTITY.to_string());

    let match_rule = match std::env::var("ST_MATCH_TOLERANCE_BPS") {
        Ok(raw) => match raw.parse() {
            Ok(basis_points) => MatchRule::Tolerance { basis_points },
            Err(_) => {
                warn!("ST_MATCH_TOLERANCE_BPS must be an integer, using exact matching");
                MatchRule::Exact
            }
        },
        Err(_) => MatchRule::Exact,
    };

    let print_metrics = std::env::var("ST_PRINT_METRICS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    RuntimeConfig {
        identity: Identity::new(identity),
        match_rule,
        print_metrics,
    }
}

async fn run_negotiation(engine: &NegotiationEngine, identity: &Identity) -> Result<()> {
    if !engine.check_system_availability().await {
        warn!("Ledger unavailable, continuing anyway");
    }

    engine.set_draft(OfferDraft {
        role: "Engineer".to_string(),
        employer_offer: "100000".to_string(),
        candidate_expectation: "100000".to_string(),
    });
    let engineer = engine
        .create_offer_from_draft(identity)
        .await
        .context("Failed to create engineer offer")?;

    let designer = engine
        .create_offer("Designer", 90_000, 95_000, identity)
        .await
        .context("Failed to create designer offer")?;
    info!(offer_id = %designer, "Second offer left encrypted");

    let outcome = engine
        .request_verification(&engineer, identity)
        .await
        .context("Failed to verify engineer offer")?;
    info!(offer_id = %engineer, ?outcome, "Verification finished");

    engine.refresh().await.context("Failed to refresh offers")?;
    let view = engine.dashboard(Some(identity));

    for offer in &view.offers {
        info!(
            offer_id = %offer.id,
            role = %offer.role,
            employer = %employer_offer_display(offer),
            candidate = offer.candidate_expectation,
            creator = %short_identity(&offer.creator),
            outcome = history_outcome(offer),
            "Offer"
        );
    }
    info!(
        total = view.stats.total,
        matches = view.stats.matches,
        verified = view.stats.verified,
        "Dashboard stats"
    );

    let json = serde_json::to_string_pretty(&view).context("Failed to encode dashboard")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and metrics
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    // Load configuration
    let runtime = load_config();
    let config = NegotiationConfig::from_env();
    info!(
        identity = %short_identity(runtime.identity.as_str()),
        match_rule = ?runtime.match_rule,
        "Starting SalaryTalk runtime"
    );

    // Wire adapters
    let ledger = Arc::new(InMemoryLedger::new().with_match_rule(runtime.match_rule));
    let gateway = Arc::new(SimulatedFheGateway::new());
    let engine = NegotiationEngine::new(config, ledger, gateway, Arc::new(PrometheusObserver));

    engine.connect(runtime.identity.clone()).await;
    let result = run_negotiation(&engine, &runtime.identity).await;
    engine.disconnect().await;

    if runtime.print_metrics {
        print!("{}", encode_metrics().context("Failed to encode metrics")?);
    }

    result
}
