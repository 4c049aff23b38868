//! # Snapshot Statistics
//!
//! Aggregate counts and per-identity history over an offer snapshot.

use crate::domain::{Identity, Offer, OfferStats};

/// Count offers, matches and verified offers.
pub fn compute_stats(offers: &[Offer]) -> OfferStats {
    OfferStats {
        total: offers.len(),
        matches: offers.iter().filter(|o| o.is_match).count(),
        verified: offers.iter().filter(|o| o.is_verified).count(),
    }
}

/// Offers created by `identity`, compared case-insensitively, in snapshot order.
pub fn compute_history(offers: &[Offer], identity: &Identity) -> Vec<Offer> {
    offers
        .iter()
        .filter(|o| identity.matches(&o.creator))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{CiphertextHandle, OfferId};
    use proptest::prelude::*;

    pub(crate) fn offer(id: &str, role: &str, creator: &str, is_match: bool, verified: bool) -> Offer {
        Offer {
            id: OfferId::new(id),
            role: role.to_string(),
            employer_offer_encrypted: CiphertextHandle([0u8; 32]),
            employer_offer_cleartext: verified.then_some(100),
            candidate_expectation: 100,
            created_at: 1_700_000_000,
            creator: creator.to_string(),
            is_match,
            is_verified: verified,
        }
    }

    pub(crate) fn arb_offers() -> impl Strategy<Value = Vec<Offer>> {
        prop::collection::vec(
            ("[A-Za-z ]{0,12}", "0x[0-9a-fA-F]{4}", any::<bool>(), any::<bool>()),
            0..24,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (role, creator, m, v))| {
                    offer(&format!("offer-{i}"), &role, &creator, m, v)
                })
                .collect()
        })
    }

    #[test]
    fn test_stats_counts() {
        let offers = vec![
            offer("1", "Engineer", "0xA", true, false),
            offer("2", "Designer", "0xB", true, true),
            offer("3", "Manager", "0xA", false, false),
        ];
        let stats = compute_stats(&offers);
        assert_eq!(stats, OfferStats { total: 3, matches: 2, verified: 1 });
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(compute_stats(&[]), OfferStats::default());
    }

    #[test]
    fn test_history_case_insensitive_and_ordered() {
        let offers = vec![
            offer("1", "Engineer", "0xABCD", true, false),
            offer("2", "Designer", "0xffff", true, true),
            offer("3", "Manager", "0xabcd", false, false),
        ];
        let history = compute_history(&offers, &Identity::new("0xAbCd"));
        let ids: Vec<_> = history.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    proptest! {
        #[test]
        fn prop_stats_bounded(offers in arb_offers()) {
            let stats = compute_stats(&offers);
            prop_assert_eq!(stats.total, offers.len());
            prop_assert!(stats.matches <= stats.total);
            prop_assert!(stats.verified <= stats.total);
        }

        #[test]
        fn prop_history_is_subsequence(offers in arb_offers(), who in "0x[0-9a-fA-F]{4}") {
            let identity = Identity::new(who);
            let history = compute_history(&offers, &identity);
            prop_assert!(history.len() <= offers.len());
            prop_assert!(history.iter().all(|o| identity.matches(&o.creator)));
        }
    }
}
