//! # ST Negotiation
//!
//! Confidential salary negotiation engine.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! An employer submits a salary offer whose figure is encrypted before it
//! leaves the client. A ledger stores the ciphertext next to the public
//! candidate expectation and decides whether the two match. Later the
//! offer can be decrypted and the cleartext proven on-chain.
//!
//! ## Guarantees
//!
//! | Rule | Enforced by |
//! |------|-------------|
//! | Cleartext only after verification | `OfferRepository`, `Offer::from_record` |
//! | Verification never reverts | `OfferRepository` |
//! | Encryption failure writes nothing | `NegotiationEngine::create_offer` |
//! | Re-verification is a no-op | `NegotiationEngine::request_verification` |
//! | Stale status clears never fire | `TransactionTracker` |
//!
//! ## Module Structure
//!
//! ```text
//! st-negotiation/
//! ├── domain/          # Offer, OfferRecord, TransactionStatus, errors, invariants
//! ├── algorithms/      # Stats, history, filtering, dashboard composition
//! ├── ports/           # NegotiationApi (inbound) + ledger/gateway/observer (outbound)
//! ├── application/     # NegotiationEngine, OfferRepository, TransactionTracker
//! ├── adapters/        # InMemoryLedger, SimulatedFheGateway
//! └── config.rs        # NegotiationConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{DecryptionFault, InMemoryLedger, MatchRule, SimulatedFheGateway, WriteFault};
pub use algorithms::{
    build_dashboard, compute_history, compute_stats, employer_offer_display, filter_offers,
    history_outcome, short_identity, DashboardView, FilterState, ENCRYPTED_PLACEHOLDER,
};
pub use application::{
    NegotiationEngine, OfferIdGenerator, OfferRepository, SessionState, TransactionTracker,
};
pub use config::NegotiationConfig;
pub use domain::{
    CiphertextHandle, ContractAddress, FailureKind, GatewayError, Identity, LedgerError,
    NegotiationError, Offer, OfferDraft, OfferId, OfferRecord, OfferStats, OperationKind,
    OperationOutcome, TransactionState, TransactionStatus, VerificationOutcome,
};
pub use ports::{
    DecryptionSubmitter, EncryptionGateway, LedgerClient, NegotiationApi, NoopObserver,
    OperationObserver, RecordingObserver,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
