//! # Session Flows
//!
//! Wallet session transitions driving the engine, status expiry across
//! operations and the Prometheus observer wired into a live engine.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::watch;

    use st_negotiation::adapters::WriteFault;
    use st_negotiation::{
        EncryptionGateway, Identity, InMemoryLedger, NegotiationApi, NegotiationConfig,
        NegotiationEngine, NegotiationError, NoopObserver, SessionState, SimulatedFheGateway,
    };
    use st_telemetry::{encode_metrics, register_metrics, PrometheusObserver, OFFERS_CREATED};

    fn engine(
        ledger: Arc<InMemoryLedger>,
        gateway: Arc<SimulatedFheGateway>,
    ) -> Arc<NegotiationEngine> {
        Arc::new(NegotiationEngine::new(
            NegotiationConfig::default(),
            ledger,
            gateway,
            Arc::new(NoopObserver),
        ))
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_wallet_switch_reinitializes_session() {
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = Arc::new(SimulatedFheGateway::new());
        let engine = engine(ledger.clone(), gateway.clone());

        let alice = Identity::new("0xA11CE");
        let bob = Identity::new("0xB0B");
        let (tx, rx) = watch::channel(SessionState::default());
        let task = Arc::clone(&engine).watch_session(rx);

        tx.send_replace(SessionState::connected(alice.clone()));
        wait_for(|| engine.identity().as_ref() == Some(&alice) && !engine.is_loading()).await;
        engine
            .create_offer("Engineer", 1, 1, &alice)
            .await
            .unwrap();

        tx.send_replace(SessionState::connected(bob.clone()));
        wait_for(|| engine.identity().as_ref() == Some(&bob)).await;
        wait_for(|| gateway.init_calls() == 2).await;
        assert!(gateway.is_initialized());

        let view = engine.dashboard(Some(&bob));
        assert!(view.history.is_empty());

        tx.send_replace(SessionState::default());
        wait_for(|| !engine.is_connected()).await;
        wait_for(|| engine.snapshot().is_empty()).await;

        let err = engine
            .create_offer("Engineer", 1, 1, &bob)
            .await
            .unwrap_err();
        assert_eq!(err, NegotiationError::NotConnected);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_case_insensitive_identity_history() {
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = Arc::new(SimulatedFheGateway::new());
        let engine = engine(ledger.clone(), gateway);

        let checksummed = Identity::new("0xAbCdEf0123456789");
        engine.connect(checksummed.clone()).await;
        engine
            .create_offer("Engineer", 1, 1, &checksummed)
            .await
            .unwrap();

        let lower = Identity::new("0xabcdef0123456789");
        let view = engine.dashboard(Some(&lower));
        assert_eq!(view.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_operation_cancels_pending_clear() {
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = Arc::new(SimulatedFheGateway::new());
        let engine = engine(ledger.clone(), gateway);
        let alice = Identity::new("0xA11CE");
        engine.connect(alice.clone()).await;

        ledger.fail_next_write(WriteFault::UserRejects);
        engine
            .create_offer("Engineer", 1, 1, &alice)
            .await
            .unwrap_err();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(engine.check_system_availability().await);

        // The error's 3s timer would have fired here
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let status = engine.transaction_status();
        assert!(status.visible);
        assert_eq!(status.message, "FHE system available!");

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(engine.transaction_status().is_idle());
    }

    #[tokio::test]
    async fn test_prometheus_observer_counts_engine_events() {
        register_metrics().unwrap();
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = Arc::new(SimulatedFheGateway::new());
        let engine = NegotiationEngine::new(
            NegotiationConfig::for_testing(),
            ledger,
            gateway,
            Arc::new(PrometheusObserver),
        );
        let alice = Identity::new("0xA11CE");
        engine.connect(alice.clone()).await;

        let before = OFFERS_CREATED.get();
        engine
            .create_offer("Engineer", 1, 1, &alice)
            .await
            .unwrap();
        assert!(OFFERS_CREATED.get() >= before + 1.0);

        let text = encode_metrics().unwrap();
        assert!(text.contains("st_operations_total"));
        assert!(text.contains("operation=\"create_offer\""));
    }
}
