//! # Domain Value Objects
//!
//! Immutable value types shared by the engine, its ports and its adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque offer identifier, assigned at creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfferId(String);

impl OfferId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet-style identity of a connected party.
///
/// Comparison between identities is case-insensitive, matching the
/// checksummed/lowercase duality of hex addresses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw identity string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.to_lowercase()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Identity {}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target context for encryption: the address of the ledger contract the
/// ciphertext is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractAddress(pub String);

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque 32-byte reference to an encrypted value held by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..4]))
    }
}

/// Output of the encryption gateway: ciphertext plus input proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    /// Encrypted bytes.
    pub ciphertext: Vec<u8>,
    /// Proof that the ciphertext was produced for the target context and owner.
    pub proof: Vec<u8>,
}

/// Evidence that a set of cleartexts are the decryptions of a set of handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionProof(pub Vec<u8>);

/// Ledger acknowledgement of a confirmed write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: [u8; 32],
    /// Ledger sequence number at which the write was confirmed.
    pub sequence: u64,
}

/// State of the session's transaction status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Operation in flight.
    #[default]
    Pending,
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
}

/// Kind of engine operation, used for busy flags, logs and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Encrypt and submit a new offer.
    CreateOffer,
    /// Decrypt and verify an offer on-chain.
    RequestVerification,
    /// Ledger liveness probe.
    CheckAvailability,
    /// Reload the offer snapshot.
    Refresh,
}

impl OperationKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOffer => "create_offer",
            Self::RequestVerification => "request_verification",
            Self::CheckAvailability => "check_availability",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an engine operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Completed.
    Success,
    /// Cancelled by the user.
    Rejected,
    /// Failed.
    Failure,
}

impl OperationOutcome {
    /// Stable label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failure => "failure",
        }
    }
}

/// Result of a successful verification request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Proof submitted and accepted in this call.
    Verified,
    /// Offer was already verified; nothing was submitted.
    AlreadyVerified,
}
