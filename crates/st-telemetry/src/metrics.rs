//! Prometheus metrics for the negotiation engine.
//!
//! All metrics follow the naming convention: `st_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: offers created, operations by outcome, skipped records
//! - **Gauge**: offers in the current snapshot
//! - **Histogram**: operation latency

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Offers confirmed by the ledger
    pub static ref OFFERS_CREATED: Counter = Counter::new(
        "st_offers_created_total",
        "Total number of offers confirmed by the ledger"
    ).expect("metric creation failed");

    /// Finished operations
    pub static ref OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("st_operations_total", "Finished engine operations"),
        &["operation", "outcome"]  // outcome: success/rejected/failure
    ).expect("metric creation failed");

    /// Records skipped during a refresh
    pub static ref REFRESH_RECORD_FAILURES: Counter = Counter::new(
        "st_refresh_record_failures_total",
        "Offer records that failed to load during a refresh"
    ).expect("metric creation failed");

    /// Offers in the current snapshot
    pub static ref OFFERS_TRACKED: Gauge = Gauge::new(
        "st_offers_tracked",
        "Number of offers in the current snapshot"
    ).expect("metric creation failed");

    /// Operation latency
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "st_operation_duration_seconds",
            "Time spent in engine operations"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("bucket creation failed")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Handle to the registry the metrics were registered in
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered metrics are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OFFERS_CREATED.clone()),
        Box::new(OPERATIONS.clone()),
        Box::new(REFRESH_RECORD_FAILURES.clone()),
        Box::new(OFFERS_TRACKED.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
