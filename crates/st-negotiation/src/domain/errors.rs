//! # Domain Errors
//!
//! Error taxonomy for the offer lifecycle engine.
//!
//! Every collaborator failure is a typed variant so that the engine can
//! classify it with a `match` instead of inspecting message strings.

use super::value_objects::{OfferId, OperationKind};
use thiserror::Error;

/// Failures reported by the ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Ledger could not be reached.
    #[error("Ledger unreachable: {0}")]
    Connectivity(String),

    /// Referenced offer id does not resolve.
    #[error("Offer not found: {0}")]
    NotFound(OfferId),

    /// An offer with this id already exists.
    #[error("Offer id already exists: {0}")]
    DuplicateId(OfferId),

    /// The user declined to sign the transaction.
    #[error("Transaction rejected by user")]
    UserRejected,

    /// The ledger executed and reverted the transaction.
    #[error("Transaction reverted: {0}")]
    Reverted(String),
}

/// Failures reported by the encryption gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Encryption session has not been initialized.
    #[error("Encryption session unavailable")]
    EncryptionUnavailable,

    /// Decryption session has not been initialized.
    #[error("Decryption session unavailable")]
    DecryptionUnavailable,

    /// The decryption protocol refused to produce a proof.
    #[error("Decryption rejected: {0}")]
    DecryptionRejected(String),

    /// The user declined the decryption authorization signature.
    #[error("Decryption authorization rejected by user")]
    UserRejected,

    /// The proof was produced but submitting it to the ledger failed.
    #[error("Proof submission failed: {0}")]
    Submission(#[from] LedgerError),
}

/// Coarse classification of a failure, used to pick user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Deliberate cancellation by the user.
    UserRejected,
    /// Encryption or decryption session not ready.
    Unavailable,
    /// Referenced record missing.
    NotFound,
    /// Ledger unreachable.
    Connectivity,
    /// Anything else.
    Other,
}

/// Errors returned by [`crate::application::NegotiationEngine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// Ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Encryption gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No identity is connected.
    #[error("No identity connected")]
    NotConnected,

    /// An operation of the same kind is still in flight.
    #[error("{0} already in progress")]
    OperationInProgress(OperationKind),

    /// The create-offer draft is incomplete.
    #[error("Invalid offer draft: {0}")]
    InvalidDraft(String),
}

impl LedgerError {
    /// Classify this ledger failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            LedgerError::Connectivity(_) => FailureKind::Connectivity,
            LedgerError::NotFound(_) => FailureKind::NotFound,
            LedgerError::UserRejected => FailureKind::UserRejected,
            LedgerError::DuplicateId(_) | LedgerError::Reverted(_) => FailureKind::Other,
        }
    }
}

impl GatewayError {
    /// Classify this gateway failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GatewayError::EncryptionUnavailable | GatewayError::DecryptionUnavailable => {
                FailureKind::Unavailable
            }
            GatewayError::UserRejected => FailureKind::UserRejected,
            GatewayError::DecryptionRejected(_) => FailureKind::Other,
            GatewayError::Submission(inner) => inner.failure_kind(),
        }
    }
}

impl NegotiationError {
    /// Classify this failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            NegotiationError::Ledger(e) => e.failure_kind(),
            NegotiationError::Gateway(e) => e.failure_kind(),
            NegotiationError::NotConnected => FailureKind::Unavailable,
            NegotiationError::OperationInProgress(_) | NegotiationError::InvalidDraft(_) => {
                FailureKind::Other
            }
        }
    }

    /// True if the user deliberately cancelled a signing step.
    pub fn is_user_rejection(&self) -> bool {
        self.failure_kind() == FailureKind::UserRejected
    }
}
