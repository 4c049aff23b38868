//! # Offer Repository
//!
//! In-memory materialized view of every offer on the ledger.
//!
//! A refresh lists all ids, then fetches each record. A failed record is
//! logged and skipped; only a failed id listing fails the refresh, and in
//! that case the previous snapshot stays in place. The snapshot is always
//! replaced wholesale.

use crate::domain::{
    invariant_cleartext_requires_verification, invariant_unique_ids,
    invariant_verified_monotonic, LedgerError, Offer,
};
use crate::ports::{LedgerClient, OperationObserver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Materialized offer view.
pub struct OfferRepository {
    ledger: Arc<dyn LedgerClient>,
    observer: Arc<dyn OperationObserver>,
    snapshot: RwLock<Arc<Vec<Offer>>>,
}

impl OfferRepository {
    /// Create an empty repository.
    pub fn new(ledger: Arc<dyn LedgerClient>, observer: Arc<dyn OperationObserver>) -> Self {
        Self {
            ledger,
            observer,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Most recent snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Offer>> {
        Arc::clone(&self.snapshot.read())
    }

    /// Drop the snapshot.
    pub fn clear(&self) {
        *self.snapshot.write() = Arc::new(Vec::new());
        self.observer.snapshot_replaced(0);
    }

    /// Reload every offer from the ledger.
    pub async fn refresh(&self) -> Result<Arc<Vec<Offer>>, LedgerError> {
        let ids = self.ledger.list_offer_ids().await.map_err(|e| {
            warn!("[st-negotiation] Offer listing failed: {}", e);
            e
        })?;
        debug!("[st-negotiation] Refreshing {} offers", ids.len());

        let mut offers = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.ledger.get_offer(id).await {
                Ok(record) => offers.push(Offer::from_record(record)),
                Err(e) => {
                    warn!(offer_id = %id, "[st-negotiation] Skipping offer: {}", e);
                    self.observer.record_fetch_failed(id);
                }
            }
        }

        if let Some(dup) = invariant_unique_ids(&offers) {
            warn!(offer_id = %dup, "[st-negotiation] Ledger returned duplicate id");
        }

        // Merge and swap under one guard so a concurrent refresh cannot
        // replace the snapshot between the two.
        let offers = {
            let mut snapshot = self.snapshot.write();
            let merged = Arc::new(enforce_monotonic(&snapshot, offers));
            *snapshot = Arc::clone(&merged);
            merged
        };
        self.observer.snapshot_replaced(offers.len());

        Ok(offers)
    }
}

/// Carry verification forward for offers a stale ledger read reports as
/// unverified, and drop any cleartext the ledger exposed too early.
fn enforce_monotonic(previous: &[Offer], mut offers: Vec<Offer>) -> Vec<Offer> {
    let verified: HashMap<_, _> = previous
        .iter()
        .filter(|o| o.is_verified)
        .map(|o| (&o.id, o.employer_offer_cleartext))
        .collect();

    for offer in &mut offers {
        if let Some(cleartext) = verified.get(&offer.id) {
            if !invariant_verified_monotonic(true, offer.is_verified) {
                warn!(
                    offer_id = %offer.id,
                    "[st-negotiation] Ledger reported verified offer as unverified, keeping verification"
                );
                offer.is_verified = true;
                offer.employer_offer_cleartext = *cleartext;
            }
        }
        if !invariant_cleartext_requires_verification(offer) {
            offer.employer_offer_cleartext = None;
        }
    }

    offers
}
