//! # Offer Lifecycle Scenarios
//!
//! End-to-end runs of the negotiation engine over the in-memory ledger and
//! the simulated FHE gateway.
//!
//! ## Flows Tested:
//!
//! 1. **Create → refresh**: a confirmed offer shows up encrypted and matched
//! 2. **Verify**: the cleartext appears only after the proof is accepted
//! 3. **Rejection and atomicity**: failed creates never leave an id behind
//! 4. **Refresh resilience**: one bad record never hides the others

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use st_negotiation::adapters::{DecryptionFault, WriteFault};
    use st_negotiation::ports::RecordingObserver;
    use st_negotiation::{
        compute_stats, employer_offer_display, filter_offers, GatewayError, Identity,
        InMemoryLedger, LedgerClient, MatchRule, NegotiationApi, NegotiationConfig,
        NegotiationEngine, OfferId, OperationKind, OperationOutcome, SimulatedFheGateway,
        TransactionState, VerificationOutcome, ENCRYPTED_PLACEHOLDER,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const EMPLOYER: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";

    struct Negotiation {
        engine: NegotiationEngine,
        ledger: Arc<InMemoryLedger>,
        gateway: Arc<SimulatedFheGateway>,
        observer: Arc<RecordingObserver>,
        employer: Identity,
    }

    async fn negotiation_with(ledger: InMemoryLedger) -> Negotiation {
        let ledger = Arc::new(ledger);
        let gateway = Arc::new(SimulatedFheGateway::new());
        let observer = Arc::new(RecordingObserver::default());
        let engine = NegotiationEngine::new(
            NegotiationConfig::default(),
            ledger.clone(),
            gateway.clone(),
            observer.clone(),
        );
        let employer = Identity::new(EMPLOYER);
        engine.connect(employer.clone()).await;

        Negotiation {
            engine,
            ledger,
            gateway,
            observer,
            employer,
        }
    }

    async fn negotiation() -> Negotiation {
        negotiation_with(InMemoryLedger::new()).await
    }

    // =============================================================================
    // CREATE AND VERIFY
    // =============================================================================

    #[tokio::test]
    async fn test_engineer_offer_matches_and_stays_encrypted() {
        let n = negotiation().await;

        n.engine
            .create_offer("Engineer", 100_000, 100_000, &n.employer)
            .await
            .unwrap();
        let offers = n.engine.refresh().await.unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].role, "Engineer");
        assert!(offers[0].is_match);
        assert!(!offers[0].is_verified);
        assert_eq!(employer_offer_display(&offers[0]), ENCRYPTED_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_verification_reveals_employer_offer() {
        let n = negotiation().await;
        let id = n
            .engine
            .create_offer("Engineer", 100_000, 100_000, &n.employer)
            .await
            .unwrap();

        let outcome = n
            .engine
            .request_verification(&id, &n.employer)
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::Verified);

        let offers = n.engine.refresh().await.unwrap();
        assert!(offers[0].is_verified);
        assert_eq!(offers[0].employer_offer_cleartext, Some(100_000));
        assert_eq!(employer_offer_display(&offers[0]), "100000");

        let status = n.engine.transaction_status();
        assert_eq!(status.state, TransactionState::Success);
        assert_eq!(status.message, "Decryption verified on-chain!");
    }

    #[tokio::test]
    async fn test_second_verification_makes_no_calls() {
        let n = negotiation().await;
        let id = n
            .engine
            .create_offer("Engineer", 100_000, 100_000, &n.employer)
            .await
            .unwrap();
        n.engine
            .request_verification(&id, &n.employer)
            .await
            .unwrap();

        let decrypts = n.gateway.decrypt_calls();
        let writes = n.ledger.verification_calls();

        let outcome = n
            .engine
            .request_verification(&id, &n.employer)
            .await
            .unwrap();
        assert_eq!(outcome, VerificationOutcome::AlreadyVerified);
        assert_eq!(n.gateway.decrypt_calls(), decrypts);
        assert_eq!(n.ledger.verification_calls(), writes);
        assert_eq!(
            n.engine.transaction_status().message,
            "Already verified on-chain"
        );
    }

    #[tokio::test]
    async fn test_tolerance_rule_is_ledger_decision() {
        let n =
            negotiation_with(InMemoryLedger::new().with_match_rule(MatchRule::Tolerance {
                basis_points: 500,
            }))
            .await;

        n.engine
            .create_offer("Engineer", 96_000, 100_000, &n.employer)
            .await
            .unwrap();
        n.engine
            .create_offer("Designer", 80_000, 100_000, &n.employer)
            .await
            .unwrap();

        let offers = n.engine.refresh().await.unwrap();
        assert!(offers[0].is_match);
        assert!(!offers[1].is_match);
        assert_eq!(compute_stats(&offers).matches, 1);
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_cancelled_signature_leaves_ids_unchanged() {
        let n = negotiation().await;
        n.engine
            .create_offer("Engineer", 1, 1, &n.employer)
            .await
            .unwrap();
        let before = n.ledger.list_offer_ids().await.unwrap();

        n.ledger.fail_next_write(WriteFault::UserRejects);
        let err = n
            .engine
            .create_offer("Designer", 2, 2, &n.employer)
            .await
            .unwrap_err();
        assert!(err.is_user_rejection());

        let status = n.engine.transaction_status();
        assert_eq!(status.state, TransactionState::Error);
        assert_eq!(status.message, "Transaction rejected");
        assert_eq!(n.ledger.list_offer_ids().await.unwrap(), before);
        assert_eq!(
            n.observer.outcomes(OperationKind::CreateOffer),
            vec![OperationOutcome::Success, OperationOutcome::Rejected]
        );
    }

    #[tokio::test]
    async fn test_encryption_failure_is_atomic() {
        let n = negotiation().await;
        n.gateway
            .fail_encryption(Some(GatewayError::EncryptionUnavailable));

        n.engine
            .create_offer("Engineer", 1, 1, &n.employer)
            .await
            .unwrap_err();

        assert!(n.ledger.list_offer_ids().await.unwrap().is_empty());
        assert_eq!(n.ledger.create_calls(), 0);
        assert_eq!(n.engine.transaction_status().message, "Creation failed");
    }

    #[tokio::test]
    async fn test_cancelled_decryption_leaves_offer_encrypted() {
        let n = negotiation().await;
        let id = n
            .engine
            .create_offer("Engineer", 5, 5, &n.employer)
            .await
            .unwrap();
        n.gateway.reject_next_decryption(DecryptionFault::UserRejects);

        n.engine
            .request_verification(&id, &n.employer)
            .await
            .unwrap_err();

        assert_eq!(n.engine.transaction_status().message, "Decryption failed");
        assert_eq!(
            n.observer.outcomes(OperationKind::RequestVerification),
            vec![OperationOutcome::Rejected]
        );
        let record = n.ledger.get_offer(&id).await.unwrap();
        assert!(!record.is_verified);
    }

    // =============================================================================
    // REFRESH
    // =============================================================================

    #[tokio::test]
    async fn test_one_failed_record_is_skipped() {
        let n = negotiation().await;
        for i in 0..5 {
            n.ledger
                .seed_offer(&format!("seed-{i}"), "Analyst", 10, 10, "0xB0B");
        }
        n.ledger.fail_record(&OfferId::new("seed-2"));

        let offers = n.engine.refresh().await.unwrap();
        assert_eq!(offers.len(), 4);
        assert!(offers.iter().all(|o| o.id.as_str() != "seed-2"));
        assert_eq!(
            *n.observer.fetch_failures.lock(),
            vec![OfferId::new("seed-2")]
        );
    }

    #[tokio::test]
    async fn test_verified_offer_never_regresses() {
        let n = negotiation().await;
        let id = n
            .engine
            .create_offer("Engineer", 7, 7, &n.employer)
            .await
            .unwrap();
        n.engine
            .request_verification(&id, &n.employer)
            .await
            .unwrap();

        n.ledger.set_verified_flag(&id, false);
        for _ in 0..3 {
            let offers = n.engine.refresh().await.unwrap();
            assert!(offers[0].is_verified);
        }
    }

    #[tokio::test]
    async fn test_filters_over_live_snapshot() {
        let n = negotiation().await;
        let engineer = n
            .engine
            .create_offer("Senior Engineer", 3, 3, &n.employer)
            .await
            .unwrap();
        n.engine
            .create_offer("Designer", 3, 4, &n.employer)
            .await
            .unwrap();
        n.engine
            .request_verification(&engineer, &n.employer)
            .await
            .unwrap();

        let offers = n.engine.refresh().await.unwrap();
        assert_eq!(filter_offers(&offers, "", false), *offers);
        assert_eq!(filter_offers(&offers, "ENGINEER", false).len(), 1);
        assert_eq!(filter_offers(&offers, "", true).len(), 1);

        n.engine.set_verified_only(true);
        let view = n.engine.dashboard(Some(&n.employer));
        assert_eq!(view.offers.len(), 1);
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.stats.verified, 1);
    }
}
