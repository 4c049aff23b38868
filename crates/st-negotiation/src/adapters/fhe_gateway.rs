//! Simulated FHE Gateway Adapter
//!
//! Implements `EncryptionGateway` with a keyed SHA-256 stream cipher.
//! The gateway plays the role of the key management service: it remembers
//! every ciphertext it produced by handle so it can later decrypt it and
//! emit a decryption proof the in-memory ledger accepts.
//!
//! Not a real FHE scheme; ciphertexts only exist to exercise the engine.

use crate::domain::{
    CiphertextHandle, ContractAddress, DecryptionProof, EncryptedInput, GatewayError, Identity,
    TxReceipt,
};
use crate::ports::outbound::{DecryptionSubmitter, EncryptionGateway};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const NONCE_LEN: usize = 16;

/// Handle the ledger assigns to a ciphertext.
pub fn handle_for(ciphertext: &[u8]) -> CiphertextHandle {
    let mut hasher = Sha256::new();
    hasher.update(b"st-handle");
    hasher.update(ciphertext);
    CiphertextHandle(hasher.finalize().into())
}

/// Input proof binding a ciphertext to its target contract and owner.
pub fn input_proof(ciphertext: &[u8], target: &ContractAddress, owner: &Identity) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(b"st-input");
    hasher.update(ciphertext);
    hasher.update(target.0.as_bytes());
    hasher.update(owner.as_str().to_lowercase().as_bytes());
    hasher.finalize().to_vec()
}

/// Decryption proof binding handles to their cleartexts.
pub fn decryption_proof(handles: &[CiphertextHandle], cleartexts: &[u64]) -> DecryptionProof {
    let mut hasher = Sha256::new();
    hasher.update(b"st-decrypt");
    for handle in handles {
        hasher.update(handle.0);
    }
    for value in cleartexts {
        hasher.update(value.to_le_bytes());
    }
    DecryptionProof(hasher.finalize().to_vec())
}

/// How the next decryption request should be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecryptionFault {
    /// The user cancels the authorization signature.
    UserRejects,
    /// The relayer refuses to produce a proof.
    RelayerRejects,
}

/// In-process encryption gateway.
pub struct SimulatedFheGateway {
    key: [u8; 32],
    session: Mutex<Arc<OnceCell<Identity>>>,
    ciphertexts: RwLock<HashMap<CiphertextHandle, Vec<u8>>>,
    encrypt_fault: Mutex<Option<GatewayError>>,
    decryption_fault: Mutex<Option<DecryptionFault>>,
    init_calls: AtomicUsize,
    encrypt_calls: AtomicUsize,
    decrypt_calls: AtomicUsize,
    submissions: AtomicUsize,
}

impl SimulatedFheGateway {
    /// Create a gateway with a random key.
    pub fn new() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::with_key(key)
    }

    /// Create a gateway with a fixed key.
    pub fn with_key(key: [u8; 32]) -> Self {
        Self {
            key,
            session: Mutex::new(Arc::new(OnceCell::new())),
            ciphertexts: RwLock::new(HashMap::new()),
            encrypt_fault: Mutex::new(None),
            decryption_fault: Mutex::new(None),
            init_calls: AtomicUsize::new(0),
            encrypt_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    /// Make every `encrypt` call fail with `error` until cleared.
    pub fn fail_encryption(&self, error: Option<GatewayError>) {
        *self.encrypt_fault.lock() = error;
    }

    /// Refuse the next decryption request.
    pub fn reject_next_decryption(&self, fault: DecryptionFault) {
        *self.decryption_fault.lock() = Some(fault);
    }

    /// Number of session initializations actually performed.
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Number of `encrypt` calls.
    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    /// Number of decrypt-and-prove protocol runs.
    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    /// Number of proofs handed to a submit callback.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn keystream(&self, nonce: &[u8]) -> [u8; 8] {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(nonce);
        let digest = hasher.finalize();
        let mut stream = [0u8; 8];
        stream.copy_from_slice(&digest[..8]);
        stream
    }

    fn seal(&self, plaintext: u64) -> Vec<u8> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let stream = self.keystream(&nonce);

        let mut ciphertext = nonce.to_vec();
        ciphertext.extend(
            plaintext
                .to_le_bytes()
                .iter()
                .zip(stream.iter())
                .map(|(p, k)| p ^ k),
        );
        ciphertext
    }

    fn open(&self, ciphertext: &[u8]) -> Option<u64> {
        if ciphertext.len() != NONCE_LEN + 8 {
            return None;
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        let stream = self.keystream(nonce);
        let mut plain = [0u8; 8];
        for (i, (c, k)) in body.iter().zip(stream.iter()).enumerate() {
            plain[i] = c ^ k;
        }
        Some(u64::from_le_bytes(plain))
    }
}

impl Default for SimulatedFheGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EncryptionGateway for SimulatedFheGateway {
    async fn initialize(&self, owner: &Identity) -> Result<(), GatewayError> {
        let cell = {
            let mut session = self.session.lock();
            if matches!(session.get(), Some(current) if current != owner) {
                *session = Arc::new(OnceCell::new());
            }
            Arc::clone(&session)
        };

        cell.get_or_try_init(|| async {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            info!(owner = %owner, "[st-negotiation] FHE session initialized");
            Ok::<_, GatewayError>(owner.clone())
        })
        .await?;
        Ok(())
    }

    async fn reset(&self) {
        *self.session.lock() = Arc::new(OnceCell::new());
        debug!("[st-negotiation] FHE session reset");
    }

    fn is_initialized(&self) -> bool {
        self.session.lock().initialized()
    }

    async fn encrypt(
        &self,
        target: &ContractAddress,
        owner: &Identity,
        plaintext: u64,
    ) -> Result<EncryptedInput, GatewayError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_initialized() {
            return Err(GatewayError::EncryptionUnavailable);
        }
        if let Some(err) = self.encrypt_fault.lock().clone() {
            return Err(err);
        }

        let ciphertext = self.seal(plaintext);
        let proof = input_proof(&ciphertext, target, owner);
        self.ciphertexts
            .write()
            .insert(handle_for(&ciphertext), ciphertext.clone());

        debug!(target_contract = %target, "[st-negotiation] Encrypted value");
        Ok(EncryptedInput { ciphertext, proof })
    }

    async fn verify_decryption(
        &self,
        handles: &[CiphertextHandle],
        target: &ContractAddress,
        submitter: &dyn DecryptionSubmitter,
    ) -> Result<TxReceipt, GatewayError> {
        if !self.is_initialized() {
            return Err(GatewayError::DecryptionUnavailable);
        }
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);

        match self.decryption_fault.lock().take() {
            Some(DecryptionFault::UserRejects) => return Err(GatewayError::UserRejected),
            Some(DecryptionFault::RelayerRejects) => {
                return Err(GatewayError::DecryptionRejected(
                    "relayer refused request".to_string(),
                ))
            }
            None => {}
        }

        let cleartexts = {
            let store = self.ciphertexts.read();
            handles
                .iter()
                .map(|handle| {
                    store
                        .get(handle)
                        .and_then(|ct| self.open(ct))
                        .ok_or_else(|| {
                            GatewayError::DecryptionRejected(format!("unknown handle {handle}"))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let proof = decryption_proof(handles, &cleartexts);
        debug!(
            target_contract = %target,
            handles = handles.len(),
            "[st-negotiation] Decryption proof ready, submitting"
        );
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(submitter.submit(cleartexts, proof).await?)
    }
}
