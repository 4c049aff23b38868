//! Prometheus-backed `OperationObserver`.

use st_negotiation::domain::{OfferId, OperationKind, OperationOutcome};
use st_negotiation::ports::OperationObserver;
use std::time::Duration;

use crate::metrics::{
    OFFERS_CREATED, OFFERS_TRACKED, OPERATIONS, OPERATION_DURATION, REFRESH_RECORD_FAILURES,
};

/// Records engine events into the global registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusObserver;

impl OperationObserver for PrometheusObserver {
    fn operation_finished(&self, kind: OperationKind, outcome: OperationOutcome, elapsed: Duration) {
        OPERATIONS
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
        OPERATION_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    fn offer_created(&self) {
        OFFERS_CREATED.inc();
    }

    fn record_fetch_failed(&self, id: &OfferId) {
        tracing::debug!(offer_id = %id, "Counting skipped record");
        REFRESH_RECORD_FAILURES.inc();
    }

    fn snapshot_replaced(&self, offers: usize) {
        OFFERS_TRACKED.set(offers as f64);
    }
}
