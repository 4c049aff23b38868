//! # Display Helpers
//!
//! Pure derivations the presentation layer renders directly.

use super::filter::{filter_offers, FilterState};
use super::stats::{compute_history, compute_stats};
use crate::domain::{Identity, Offer, OfferStats};
use serde::Serialize;

/// Placeholder shown for an offer that has not been verified.
pub const ENCRYPTED_PLACEHOLDER: &str = "Encrypted";

/// Everything the dashboard shows, derived from one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    /// Offers passing the current filter.
    pub offers: Vec<Offer>,
    /// Counts over the full snapshot.
    pub stats: OfferStats,
    /// Offers created by the connected identity.
    pub history: Vec<Offer>,
}

/// Compose the dashboard from a snapshot and the filter inputs.
pub fn build_dashboard(
    offers: &[Offer],
    filters: &FilterState,
    identity: Option<&Identity>,
) -> DashboardView {
    DashboardView {
        offers: filter_offers(offers, &filters.search_term, filters.verified_only),
        stats: compute_stats(offers),
        history: identity
            .map(|id| compute_history(offers, id))
            .unwrap_or_default(),
    }
}

/// `0x1234...abcd` form of an identity: first 6 and last 4 characters.
pub fn short_identity(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= 10 {
        return raw.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Employer offer as displayed: the cleartext once verified.
pub fn employer_offer_display(offer: &Offer) -> String {
    match (offer.is_verified, offer.employer_offer_cleartext) {
        (true, Some(value)) if value > 0 => value.to_string(),
        _ => ENCRYPTED_PLACEHOLDER.to_string(),
    }
}

/// History row outcome label.
pub fn history_outcome(offer: &Offer) -> &'static str {
    if offer.is_match {
        "Match"
    } else {
        "Pending"
    }
}
