//! # Outbound Ports
//!
//! Traits for the collaborators the engine depends on: the ledger, the
//! encryption gateway and an observer for operation metrics.

use crate::domain::{
    CiphertextHandle, ContractAddress, DecryptionProof, EncryptedInput, GatewayError, Identity,
    LedgerError, NewOfferSubmission, OfferId, OfferRecord, OperationKind, OperationOutcome,
    TxReceipt,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

/// Ledger client - outbound port.
///
/// A confirmed receipt means the write is visible to subsequent reads.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Address of the offer contract, used as the encryption target context.
    fn contract_address(&self) -> ContractAddress;

    /// All offer ids, in ledger order.
    async fn list_offer_ids(&self) -> Result<Vec<OfferId>, LedgerError>;

    /// Fetch a single offer record.
    async fn get_offer(&self, id: &OfferId) -> Result<OfferRecord, LedgerError>;

    /// Create a new offer. The ledger computes the match flag itself.
    async fn create_offer(&self, submission: NewOfferSubmission) -> Result<TxReceipt, LedgerError>;

    /// Handle of the ciphertext currently stored for an offer.
    async fn get_encrypted_handle(&self, id: &OfferId) -> Result<CiphertextHandle, LedgerError>;

    /// Submit decrypted values plus proof, marking the offer verified.
    async fn submit_verification(
        &self,
        id: &OfferId,
        cleartexts: Vec<u64>,
        proof: DecryptionProof,
    ) -> Result<TxReceipt, LedgerError>;

    /// Side-effect-free liveness probe.
    async fn check_availability(&self) -> Result<(), LedgerError>;
}

/// Callback the gateway invokes once the decryption proof is ready.
#[async_trait]
pub trait DecryptionSubmitter: Send + Sync {
    /// Submit the cleartexts and their proof. Invoked at most once.
    async fn submit(
        &self,
        cleartexts: Vec<u64>,
        proof: DecryptionProof,
    ) -> Result<TxReceipt, LedgerError>;
}

/// Encryption gateway - outbound port.
#[async_trait]
pub trait EncryptionGateway: Send + Sync {
    /// Initialize the session for an identity.
    ///
    /// Idempotent; concurrent callers converge on one initialization.
    async fn initialize(&self, owner: &Identity) -> Result<(), GatewayError>;

    /// Drop the current session.
    async fn reset(&self);

    /// Whether a session is ready.
    fn is_initialized(&self) -> bool;

    /// Encrypt a plaintext for a target context and owner.
    async fn encrypt(
        &self,
        target: &ContractAddress,
        owner: &Identity,
        plaintext: u64,
    ) -> Result<EncryptedInput, GatewayError>;

    /// Run the decrypt-and-prove protocol for `handles`, then hand the
    /// cleartexts and proof to `submitter` exactly once.
    async fn verify_decryption(
        &self,
        handles: &[CiphertextHandle],
        target: &ContractAddress,
        submitter: &dyn DecryptionSubmitter,
    ) -> Result<TxReceipt, GatewayError>;
}

/// Operation observer - outbound port for metrics.
pub trait OperationObserver: Send + Sync {
    /// An operation reached a terminal state.
    fn operation_finished(&self, kind: OperationKind, outcome: OperationOutcome, elapsed: Duration);

    /// A ledger write for a new offer was confirmed.
    fn offer_created(&self);

    /// One record failed to load during refresh.
    fn record_fetch_failed(&self, id: &OfferId);

    /// The snapshot was replaced.
    fn snapshot_replaced(&self, offers: usize);
}

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl OperationObserver for NoopObserver {
    fn operation_finished(&self, _: OperationKind, _: OperationOutcome, _: Duration) {}
    fn offer_created(&self) {}
    fn record_fetch_failed(&self, _: &OfferId) {}
    fn snapshot_replaced(&self, _: usize) {}
}

/// Observer that records every event, for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Finished operations in order.
    pub finished: Mutex<Vec<(OperationKind, OperationOutcome)>>,
    /// Number of created offers.
    pub created: Mutex<usize>,
    /// Ids that failed to load.
    pub fetch_failures: Mutex<Vec<OfferId>>,
    /// Snapshot sizes in order.
    pub snapshots: Mutex<Vec<usize>>,
}

impl RecordingObserver {
    /// Outcomes recorded for one operation kind.
    pub fn outcomes(&self, kind: OperationKind) -> Vec<OperationOutcome> {
        self.finished
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, outcome)| *outcome)
            .collect()
    }
}

impl OperationObserver for RecordingObserver {
    fn operation_finished(&self, kind: OperationKind, outcome: OperationOutcome, _: Duration) {
        self.finished.lock().push((kind, outcome));
    }

    fn offer_created(&self) {
        *self.created.lock() += 1;
    }

    fn record_fetch_failed(&self, id: &OfferId) {
        self.fetch_failures.lock().push(id.clone());
    }

    fn snapshot_replaced(&self, offers: usize) {
        self.snapshots.lock().push(offers);
    }
}
