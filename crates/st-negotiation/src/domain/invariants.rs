//! # Domain Invariants
//!
//! Business rules the repository and engine check on every snapshot.

use super::entities::Offer;
use super::value_objects::OfferId;
use std::collections::HashSet;

/// Auto-clear delay for a success status, in milliseconds.
pub const SUCCESS_CLEAR_MS: u64 = 2_000;

/// Auto-clear delay for an error status, in milliseconds.
pub const ERROR_CLEAR_MS: u64 = 3_000;

/// Invariant: the employer cleartext exists only on verified offers.
pub fn invariant_cleartext_requires_verification(offer: &Offer) -> bool {
    offer.employer_offer_cleartext.is_none() || offer.is_verified
}

/// Invariant: offer ids are unique within a snapshot.
///
/// Returns the first duplicated id, if any.
pub fn invariant_unique_ids(offers: &[Offer]) -> Option<OfferId> {
    let mut seen = HashSet::with_capacity(offers.len());
    offers
        .iter()
        .find(|offer| !seen.insert(&offer.id))
        .map(|offer| offer.id.clone())
}

/// Invariant: verification never reverts.
///
/// `previously_verified` is whether the prior snapshot had the offer verified.
pub fn invariant_verified_monotonic(previously_verified: bool, now_verified: bool) -> bool {
    !previously_verified || now_verified
}
