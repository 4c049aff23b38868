//! # Offer Filtering
//!
//! Role search and verified-only predicate.

use crate::domain::Offer;
use serde::{Deserialize, Serialize};

/// Filter inputs owned by the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive role substring. Empty matches everything.
    pub search_term: String,
    /// Only keep verified offers.
    pub verified_only: bool,
}

/// Whether a single offer passes the filter.
pub fn offer_matches(offer: &Offer, search_term: &str, verified_only: bool) -> bool {
    let matches_search = offer
        .role
        .to_lowercase()
        .contains(&search_term.to_lowercase());
    matches_search && (!verified_only || offer.is_verified)
}

/// Offers passing the filter, in snapshot order.
pub fn filter_offers(offers: &[Offer], search_term: &str, verified_only: bool) -> Vec<Offer> {
    offers
        .iter()
        .filter(|o| offer_matches(o, search_term, verified_only))
        .cloned()
        .collect()
}
