//! # Inbound Ports
//!
//! API trait defining what the negotiation engine offers the presentation
//! layer.

use crate::algorithms::DashboardView;
use crate::domain::{
    Identity, NegotiationError, Offer, OfferId, TransactionStatus, VerificationOutcome,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Negotiation API - inbound port.
#[async_trait]
pub trait NegotiationApi: Send + Sync {
    /// Encrypt the employer value and create a new offer on the ledger.
    async fn create_offer(
        &self,
        role: &str,
        employer_value: u64,
        candidate_value: u64,
        identity: &Identity,
    ) -> Result<OfferId, NegotiationError>;

    /// Decrypt an offer and verify the cleartext on-chain.
    async fn request_verification(
        &self,
        offer_id: &OfferId,
        identity: &Identity,
    ) -> Result<VerificationOutcome, NegotiationError>;

    /// Best-effort ledger liveness probe.
    async fn check_system_availability(&self) -> bool;

    /// Reload the offer snapshot from the ledger.
    async fn refresh(&self) -> Result<Arc<Vec<Offer>>, NegotiationError>;

    /// Current transaction status.
    fn transaction_status(&self) -> TransactionStatus;

    /// Set the role search term.
    fn set_search_term(&self, term: &str);

    /// Toggle the verified-only filter.
    fn set_verified_only(&self, verified_only: bool);

    /// Display state derived from the current snapshot.
    fn dashboard(&self, identity: Option<&Identity>) -> DashboardView;
}
