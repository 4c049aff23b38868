//! # Negotiation Engine
//!
//! Application service orchestrating the offer lifecycle.
//!
//! ## Operations
//!
//! - `create_offer`: encrypt the employer figure, write the offer, refresh
//! - `request_verification`: decrypt, prove, submit the proof, refresh
//! - `check_system_availability`: best-effort ledger probe
//! - `refresh`: reload the snapshot from the ledger
//!
//! Each mutating operation owns a busy flag and drives the
//! [`TransactionTracker`] through `pending → success | error`.
//! No lock is held across an `.await`.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::id_gen::OfferIdGenerator;
use super::repository::OfferRepository;
use super::session::{SessionContext, SessionState};
use super::tracker::TransactionTracker;
use crate::algorithms::{build_dashboard, DashboardView, FilterState};
use crate::config::NegotiationConfig;
use crate::domain::{
    DecryptionProof, Identity, LedgerError, NegotiationError, NewOfferSubmission, Offer,
    OfferDraft, OfferId, OperationKind, OperationOutcome, TransactionStatus, TxReceipt,
    VerificationOutcome,
};
use crate::ports::{
    DecryptionSubmitter, EncryptionGateway, LedgerClient, NegotiationApi, OperationObserver,
};

/// Tracker message while an offer is being encrypted and written.
pub const MSG_CREATING: &str = "Creating encrypted salary offer...";
/// Tracker message after a confirmed offer write.
pub const MSG_CREATED: &str = "Offer created with FHE encryption!";
/// Tracker message while a decryption proof is requested.
pub const MSG_VERIFYING: &str = "Requesting decryption proof...";
/// Tracker message after the proof is accepted.
pub const MSG_VERIFIED: &str = "Decryption verified on-chain!";
/// Tracker message when verification was already done.
pub const MSG_ALREADY_VERIFIED: &str = "Already verified on-chain";
/// Tracker message after a successful availability probe.
pub const MSG_AVAILABLE: &str = "FHE system available!";
/// Tracker message when the user cancels signing an offer write.
pub const MSG_REJECTED: &str = "Transaction rejected";
/// Tracker message for any other create failure.
pub const MSG_CREATE_FAILED: &str = "Creation failed";
/// Tracker message for every verification failure, cancellations included.
pub const MSG_DECRYPT_FAILED: &str = "Decryption failed";

/// Per-kind in-flight marker, released on drop.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, kind: OperationKind) -> Result<Self, NegotiationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| NegotiationError::OperationInProgress(kind))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Counts in-flight refreshes.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Submits a decryption proof for one offer, at most once.
struct LedgerSubmitter {
    ledger: Arc<dyn LedgerClient>,
    offer_id: OfferId,
    used: AtomicBool,
}

#[async_trait]
impl DecryptionSubmitter for LedgerSubmitter {
    async fn submit(
        &self,
        cleartexts: Vec<u64>,
        proof: DecryptionProof,
    ) -> Result<TxReceipt, LedgerError> {
        if self.used.swap(true, Ordering::AcqRel) {
            return Err(LedgerError::Reverted(
                "decryption proof already submitted".to_string(),
            ));
        }
        debug!(offer_id = %self.offer_id, "[st-negotiation] Submitting decryption proof");
        self.ledger
            .submit_verification(&self.offer_id, cleartexts, proof)
            .await
    }
}

/// Negotiation Engine - orchestrates the offer lifecycle.
pub struct NegotiationEngine {
    config: NegotiationConfig,
    ledger: Arc<dyn LedgerClient>,
    gateway: Arc<dyn EncryptionGateway>,
    observer: Arc<dyn OperationObserver>,
    repository: OfferRepository,
    tracker: TransactionTracker,
    session: SessionContext,
    ids: OfferIdGenerator,
    draft: Mutex<OfferDraft>,
    filters: RwLock<FilterState>,
    creating: AtomicBool,
    verifying: AtomicBool,
    loading: AtomicUsize,
}

impl NegotiationEngine {
    /// Create a disconnected engine.
    pub fn new(
        config: NegotiationConfig,
        ledger: Arc<dyn LedgerClient>,
        gateway: Arc<dyn EncryptionGateway>,
        observer: Arc<dyn OperationObserver>,
    ) -> Self {
        Self {
            repository: OfferRepository::new(Arc::clone(&ledger), Arc::clone(&observer)),
            tracker: TransactionTracker::new(
                config.success_clear_after(),
                config.error_clear_after(),
            ),
            ids: OfferIdGenerator::new(config.id_prefix.clone()),
            session: SessionContext::default(),
            draft: Mutex::new(OfferDraft::default()),
            filters: RwLock::new(FilterState::default()),
            creating: AtomicBool::new(false),
            verifying: AtomicBool::new(false),
            loading: AtomicUsize::new(0),
            config,
            ledger,
            gateway,
            observer,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Connect `identity`: initialize the encryption session, then load
    /// offers. An initialization failure is logged and not fatal.
    pub async fn connect(&self, identity: Identity) {
        info!(identity = %identity, "[st-negotiation] Session connected");
        self.session.replace(SessionState::connected(identity.clone()));

        if let Err(e) = self.gateway.initialize(&identity).await {
            warn!(identity = %identity, "[st-negotiation] FHE initialization failed: {}", e);
        }
        if let Err(e) = self.refresh_snapshot().await {
            warn!("[st-negotiation] Initial load failed: {}", e);
        }
    }

    /// Disconnect: drop the encryption session and the snapshot.
    pub async fn disconnect(&self) {
        let previous = self.session.replace(SessionState::default());
        if let Some(identity) = previous.active_identity() {
            info!(identity = %identity, "[st-negotiation] Session disconnected");
        }
        self.gateway.reset().await;
        self.repository.clear();
    }

    /// Follow session transitions published by the wallet layer.
    ///
    /// Only changes of the active identity trigger a connect or disconnect.
    pub fn watch_session(
        self: Arc<Self>,
        mut sessions: watch::Receiver<SessionState>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = sessions.borrow_and_update().clone();
            self.apply_session(initial).await;
            while sessions.changed().await.is_ok() {
                let state = sessions.borrow_and_update().clone();
                self.apply_session(state).await;
            }
            debug!("[st-negotiation] Session channel closed");
        })
    }

    async fn apply_session(&self, state: SessionState) {
        let current = self.session.identity();
        if current.as_ref() == state.active_identity() {
            return;
        }
        match state.active_identity().cloned() {
            Some(identity) => self.connect(identity).await,
            None => self.disconnect().await,
        }
    }

    /// Whether a session is connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Connected identity.
    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    // =========================================================================
    // Observable state
    // =========================================================================

    /// Current offer snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Offer>> {
        self.repository.snapshot()
    }

    /// Subscribe to transaction status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<TransactionStatus> {
        self.tracker.subscribe()
    }

    /// True while an offer is being created.
    pub fn is_creating(&self) -> bool {
        self.creating.load(Ordering::Acquire)
    }

    /// True while a verification is in flight.
    pub fn is_verifying(&self) -> bool {
        self.verifying.load(Ordering::Acquire)
    }

    /// True while a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire) > 0
    }

    /// Current create-form draft.
    pub fn draft(&self) -> OfferDraft {
        self.draft.lock().clone()
    }

    /// Replace the create-form draft.
    pub fn set_draft(&self, draft: OfferDraft) {
        *self.draft.lock() = draft;
    }

    /// Current filter inputs.
    pub fn filters(&self) -> FilterState {
        self.filters.read().clone()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Submit the create-form draft. The draft is cleared on success.
    pub async fn create_offer_from_draft(
        &self,
        identity: &Identity,
    ) -> Result<OfferId, NegotiationError> {
        let draft = self.draft();
        if !draft.is_submittable() {
            return Err(NegotiationError::InvalidDraft(
                "all fields are required".to_string(),
            ));
        }
        self.create_offer(
            draft.role.trim(),
            draft.employer_value(),
            draft.candidate_value(),
            identity,
        )
        .await
    }

    async fn encrypt_and_submit(
        &self,
        role: &str,
        employer_value: u64,
        candidate_value: u64,
        identity: &Identity,
    ) -> Result<OfferId, NegotiationError> {
        let target = self.ledger.contract_address();
        let encrypted = self
            .gateway
            .encrypt(&target, identity, employer_value)
            .await?;

        let mut retries = 0;
        loop {
            let id = self.ids.next_id();
            let submission = NewOfferSubmission {
                id: id.clone(),
                role: role.to_string(),
                encrypted: encrypted.clone(),
                employer_comparator: employer_value,
                candidate_expectation: candidate_value,
                note: self.config.offer_note.clone(),
                creator: identity.clone(),
            };

            match self.ledger.create_offer(submission).await {
                Ok(receipt) => {
                    info!(
                        offer_id = %id,
                        sequence = receipt.sequence,
                        tx_hash = %hex::encode(receipt.tx_hash),
                        "[st-negotiation] Offer confirmed"
                    );
                    return Ok(id);
                }
                Err(LedgerError::DuplicateId(taken)) if retries < self.config.duplicate_id_retries => {
                    retries += 1;
                    warn!(offer_id = %taken, retries, "[st-negotiation] Offer id taken, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn decrypt_and_verify(
        &self,
        offer_id: &OfferId,
    ) -> Result<VerificationOutcome, NegotiationError> {
        let record = self.ledger.get_offer(offer_id).await?;
        if record.is_verified {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        let handle = self.ledger.get_encrypted_handle(offer_id).await?;
        let submitter = LedgerSubmitter {
            ledger: Arc::clone(&self.ledger),
            offer_id: offer_id.clone(),
            used: AtomicBool::new(false),
        };
        let receipt = self
            .gateway
            .verify_decryption(&[handle], &self.ledger.contract_address(), &submitter)
            .await?;

        info!(
            offer_id = %offer_id,
            sequence = receipt.sequence,
            "[st-negotiation] Decryption proof accepted"
        );
        Ok(VerificationOutcome::Verified)
    }

    async fn refresh_snapshot(&self) -> Result<Arc<Vec<Offer>>, NegotiationError> {
        let _loading = LoadingGuard::enter(&self.loading);
        let started = Instant::now();
        let result = self.repository.refresh().await;
        let outcome = if result.is_ok() {
            OperationOutcome::Success
        } else {
            OperationOutcome::Failure
        };
        self.observer
            .operation_finished(OperationKind::Refresh, outcome, started.elapsed());
        result.map_err(NegotiationError::from)
    }

    /// Refresh after a confirmed write. Failures only log; the write stands.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh_snapshot().await {
            warn!("[st-negotiation] Refresh after write failed: {}", e);
        }
    }

    fn outcome_of(err: &NegotiationError) -> OperationOutcome {
        if err.is_user_rejection() {
            OperationOutcome::Rejected
        } else {
            OperationOutcome::Failure
        }
    }
}

#[async_trait]
impl NegotiationApi for NegotiationEngine {
    async fn create_offer(
        &self,
        role: &str,
        employer_value: u64,
        candidate_value: u64,
        identity: &Identity,
    ) -> Result<OfferId, NegotiationError> {
        if !self.is_connected() {
            return Err(NegotiationError::NotConnected);
        }
        let _busy = BusyGuard::acquire(&self.creating, OperationKind::CreateOffer)?;

        let op_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(%op_id, role, creator = %identity, "[st-negotiation] Creating offer");
        self.tracker.pending(MSG_CREATING);

        let result = self
            .encrypt_and_submit(role, employer_value, candidate_value, identity)
            .await;

        let outcome = match &result {
            Ok(id) => {
                self.tracker.succeed(MSG_CREATED);
                self.observer.offer_created();
                self.refresh_after_write().await;
                *self.draft.lock() = OfferDraft::default();
                info!(%op_id, offer_id = %id, "[st-negotiation] Offer created");
                OperationOutcome::Success
            }
            Err(e) => {
                let outcome = Self::outcome_of(e);
                if outcome == OperationOutcome::Rejected {
                    self.tracker.fail(MSG_REJECTED);
                    warn!(%op_id, "[st-negotiation] Offer creation rejected by user");
                } else {
                    self.tracker.fail(MSG_CREATE_FAILED);
                    error!(%op_id, "[st-negotiation] Offer creation failed: {}", e);
                }
                outcome
            }
        };
        self.observer
            .operation_finished(OperationKind::CreateOffer, outcome, started.elapsed());
        result
    }

    async fn request_verification(
        &self,
        offer_id: &OfferId,
        identity: &Identity,
    ) -> Result<VerificationOutcome, NegotiationError> {
        if !self.is_connected() {
            return Err(NegotiationError::NotConnected);
        }
        let _busy = BusyGuard::acquire(&self.verifying, OperationKind::RequestVerification)?;

        let op_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(%op_id, offer_id = %offer_id, requester = %identity, "[st-negotiation] Verifying offer");
        self.tracker.pending(MSG_VERIFYING);

        let result = self.decrypt_and_verify(offer_id).await;

        let outcome = match &result {
            Ok(verification) => {
                let message = match verification {
                    VerificationOutcome::Verified => MSG_VERIFIED,
                    VerificationOutcome::AlreadyVerified => MSG_ALREADY_VERIFIED,
                };
                self.tracker.succeed(message);
                self.refresh_after_write().await;
                info!(%op_id, offer_id = %offer_id, ?verification, "[st-negotiation] Verification finished");
                OperationOutcome::Success
            }
            Err(e) => {
                let outcome = Self::outcome_of(e);
                self.tracker.fail(MSG_DECRYPT_FAILED);
                if outcome == OperationOutcome::Rejected {
                    warn!(%op_id, offer_id = %offer_id, "[st-negotiation] Decryption rejected by user");
                } else {
                    error!(%op_id, offer_id = %offer_id, "[st-negotiation] Verification failed: {}", e);
                }
                outcome
            }
        };
        self.observer.operation_finished(
            OperationKind::RequestVerification,
            outcome,
            started.elapsed(),
        );
        result
    }

    async fn check_system_availability(&self) -> bool {
        let started = Instant::now();
        let available = match self.ledger.check_availability().await {
            Ok(()) => {
                self.tracker.succeed(MSG_AVAILABLE);
                true
            }
            Err(e) => {
                warn!("[st-negotiation] Availability check failed: {}", e);
                false
            }
        };
        let outcome = if available {
            OperationOutcome::Success
        } else {
            OperationOutcome::Failure
        };
        self.observer
            .operation_finished(OperationKind::CheckAvailability, outcome, started.elapsed());
        available
    }

    async fn refresh(&self) -> Result<Arc<Vec<Offer>>, NegotiationError> {
        if !self.is_connected() {
            debug!("[st-negotiation] Not connected, skipping refresh");
            return Ok(self.snapshot());
        }
        self.refresh_snapshot().await
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.tracker.status()
    }

    fn set_search_term(&self, term: &str) {
        self.filters.write().search_term = term.to_string();
    }

    fn set_verified_only(&self, verified_only: bool) {
        self.filters.write().verified_only = verified_only;
    }

    fn dashboard(&self, identity: Option<&Identity>) -> DashboardView {
        let offers = self.snapshot();
        let filters = self.filters.read();
        build_dashboard(&offers, &filters, identity)
    }
}
