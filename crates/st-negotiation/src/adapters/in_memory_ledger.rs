//! In-Memory Ledger Adapter
//!
//! Implements `LedgerClient` as an ordered offer table. The ledger computes
//! the match flag itself, checks input proofs on create and decryption
//! proofs on verification, and supports fault injection for tests.

use super::fhe_gateway::{decryption_proof, handle_for, input_proof};
use crate::domain::{
    CiphertextHandle, ContractAddress, DecryptionProof, LedgerError, NewOfferSubmission, OfferId,
    OfferRecord, TxReceipt,
};
use crate::ports::outbound::LedgerClient;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Address the in-memory offer contract reports.
pub const IN_MEMORY_CONTRACT: &str = "0x5a1a7a1c0000000000000000000000000000c0de";

/// How the ledger decides `is_match` for a new offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MatchRule {
    /// Employer offer equals the candidate expectation.
    #[default]
    Exact,
    /// Employer offer is within `basis_points` of the candidate expectation.
    Tolerance {
        /// Allowed distance, in hundredths of a percent.
        basis_points: u32,
    },
}

impl MatchRule {
    /// Evaluate the rule.
    pub fn is_match(&self, employer: u64, candidate: u64) -> bool {
        match self {
            MatchRule::Exact => employer == candidate,
            MatchRule::Tolerance { basis_points } => {
                let distance = u128::from(employer.abs_diff(candidate));
                distance * 10_000 <= u128::from(candidate) * u128::from(*basis_points)
            }
        }
    }
}

/// Single-use write failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteFault {
    /// User cancels the signature.
    UserRejects,
    /// Transaction reverts with the given reason.
    Reverts(String),
    /// Ledger reports the submitted id as taken.
    DuplicateId,
}

#[derive(Default)]
struct LedgerState {
    order: Vec<OfferId>,
    records: HashMap<OfferId, OfferRecord>,
    sequence: u64,
    reachable: bool,
    failing_records: HashSet<OfferId>,
    next_write_fault: Option<WriteFault>,
}

/// In-memory offer ledger.
pub struct InMemoryLedger {
    address: ContractAddress,
    match_rule: MatchRule,
    state: RwLock<LedgerState>,
    create_calls: AtomicUsize,
    verification_calls: AtomicUsize,
}

impl InMemoryLedger {
    /// Create an empty, reachable ledger with the exact match rule.
    pub fn new() -> Self {
        Self {
            address: ContractAddress(IN_MEMORY_CONTRACT.to_string()),
            match_rule: MatchRule::Exact,
            state: RwLock::new(LedgerState {
                reachable: true,
                ..Default::default()
            }),
            create_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
        }
    }

    /// Use a different match rule.
    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.match_rule = rule;
        self
    }

    /// Insert an offer directly, bypassing proofs. The handle is derived
    /// from the id so seeded offers can never be decrypted.
    pub fn seed_offer(
        &self,
        id: &str,
        role: &str,
        employer_value: u64,
        candidate_value: u64,
        creator: &str,
    ) {
        let id = OfferId::new(id);
        let record = OfferRecord {
            id: id.clone(),
            role: role.to_string(),
            encrypted_offer: handle_for(id.as_str().as_bytes()),
            employer_comparator: json!(employer_value),
            candidate_expectation: json!(candidate_value),
            decrypted_value: json!(0),
            created_at: json!(unix_seconds()),
            creator: creator.to_string(),
            is_match: self.match_rule.is_match(employer_value, candidate_value),
            is_verified: false,
            note: String::new(),
        };
        let mut state = self.state.write();
        if state.records.insert(id.clone(), record).is_none() {
            state.order.push(id);
        }
    }

    /// Toggle reachability. While unreachable every call fails.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.write().reachable = reachable;
    }

    /// Make `get_offer` fail for one id.
    pub fn fail_record(&self, id: &OfferId) {
        self.state.write().failing_records.insert(id.clone());
    }

    /// Overwrite a record's raw numeric fields.
    pub fn corrupt_record(&self, id: &OfferId, field: &str, value: serde_json::Value) {
        let mut state = self.state.write();
        let Some(record) = state.records.get_mut(id) else {
            return;
        };
        match field {
            "candidate_expectation" => record.candidate_expectation = value,
            "created_at" => record.created_at = value,
            "decrypted_value" => record.decrypted_value = value,
            other => warn!(field = other, "[st-negotiation] Unknown record field"),
        }
    }

    /// Force a record's verification flag, simulating a lagging replica.
    pub fn set_verified_flag(&self, id: &OfferId, verified: bool) {
        if let Some(record) = self.state.write().records.get_mut(id) {
            record.is_verified = verified;
        }
    }

    /// Fail the next write.
    pub fn fail_next_write(&self, fault: WriteFault) {
        self.state.write().next_write_fault = Some(fault);
    }

    /// Number of `create_offer` calls, including failed ones.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `submit_verification` calls, including failed ones.
    pub fn verification_calls(&self) -> usize {
        self.verification_calls.load(Ordering::SeqCst)
    }

    /// Raw record, bypassing fault injection.
    pub fn record(&self, id: &OfferId) -> Option<OfferRecord> {
        self.state.read().records.get(id).cloned()
    }

    fn ensure_reachable(&self) -> Result<(), LedgerError> {
        if self.state.read().reachable {
            Ok(())
        } else {
            Err(LedgerError::Connectivity("ledger offline".to_string()))
        }
    }

    fn take_write_fault(state: &mut LedgerState, id: &OfferId) -> Result<(), LedgerError> {
        match state.next_write_fault.take() {
            Some(WriteFault::UserRejects) => Err(LedgerError::UserRejected),
            Some(WriteFault::Reverts(reason)) => Err(LedgerError::Reverted(reason)),
            Some(WriteFault::DuplicateId) => Err(LedgerError::DuplicateId(id.clone())),
            None => Ok(()),
        }
    }

    fn receipt(state: &mut LedgerState, id: &OfferId) -> TxReceipt {
        state.sequence += 1;
        let mut hasher = Sha256::new();
        hasher.update(id.as_str().as_bytes());
        hasher.update(state.sequence.to_le_bytes());
        TxReceipt {
            tx_hash: hasher.finalize().into(),
            sequence: state.sequence,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    fn contract_address(&self) -> ContractAddress {
        self.address.clone()
    }

    async fn list_offer_ids(&self) -> Result<Vec<OfferId>, LedgerError> {
        self.ensure_reachable()?;
        Ok(self.state.read().order.clone())
    }

    async fn get_offer(&self, id: &OfferId) -> Result<OfferRecord, LedgerError> {
        self.ensure_reachable()?;
        let state = self.state.read();
        if state.failing_records.contains(id) {
            return Err(LedgerError::Connectivity(format!("read of {id} timed out")));
        }
        state
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn create_offer(&self, submission: NewOfferSubmission) -> Result<TxReceipt, LedgerError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;

        let mut state = self.state.write();
        Self::take_write_fault(&mut state, &submission.id)?;

        if state.records.contains_key(&submission.id) {
            return Err(LedgerError::DuplicateId(submission.id));
        }

        let expected = input_proof(
            &submission.encrypted.ciphertext,
            &self.address,
            &submission.creator,
        );
        if submission.encrypted.proof != expected {
            return Err(LedgerError::Reverted("invalid input proof".to_string()));
        }

        let is_match = self
            .match_rule
            .is_match(submission.employer_comparator, submission.candidate_expectation);
        let id = submission.id.clone();
        let record = OfferRecord {
            id: id.clone(),
            role: submission.role,
            encrypted_offer: handle_for(&submission.encrypted.ciphertext),
            employer_comparator: json!(submission.employer_comparator),
            candidate_expectation: json!(submission.candidate_expectation),
            decrypted_value: json!(0),
            created_at: json!(unix_seconds()),
            creator: submission.creator.as_str().to_string(),
            is_match,
            is_verified: false,
            note: submission.note,
        };
        state.records.insert(id.clone(), record);
        state.order.push(id.clone());

        let receipt = Self::receipt(&mut state, &id);
        info!(
            offer_id = %id,
            is_match,
            sequence = receipt.sequence,
            "[st-negotiation] Offer stored on ledger"
        );
        Ok(receipt)
    }

    async fn get_encrypted_handle(&self, id: &OfferId) -> Result<CiphertextHandle, LedgerError> {
        self.ensure_reachable()?;
        self.state
            .read()
            .records
            .get(id)
            .map(|r| r.encrypted_offer)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn submit_verification(
        &self,
        id: &OfferId,
        cleartexts: Vec<u64>,
        proof: DecryptionProof,
    ) -> Result<TxReceipt, LedgerError> {
        self.verification_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;

        let mut state = self.state.write();
        Self::take_write_fault(&mut state, id)?;

        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if record.is_verified {
            return Err(LedgerError::Reverted("offer already verified".to_string()));
        }
        let [value] = cleartexts.as_slice() else {
            return Err(LedgerError::Reverted(format!(
                "expected one cleartext, got {}",
                cleartexts.len()
            )));
        };
        if proof != decryption_proof(&[record.encrypted_offer], &cleartexts) {
            return Err(LedgerError::Reverted("invalid decryption proof".to_string()));
        }

        record.decrypted_value = json!(*value);
        record.is_verified = true;

        let receipt = Self::receipt(&mut state, id);
        debug!(offer_id = %id, sequence = receipt.sequence, "[st-negotiation] Offer verified");
        Ok(receipt)
    }

    async fn check_availability(&self) -> Result<(), LedgerError> {
        self.ensure_reachable()
    }
}
