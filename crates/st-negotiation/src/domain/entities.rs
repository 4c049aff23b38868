//! # Domain Entities
//!
//! The `Offer` snapshot entity, the raw ledger record it is mapped from,
//! the create-form draft and the session-wide transaction status.

use super::value_objects::{CiphertextHandle, EncryptedInput, Identity, OfferId, TransactionState};
use serde::{Deserialize, Serialize};

/// Raw numeric field as stored by the ledger.
///
/// Ledgers hand back big integers, decimal strings or garbage; mapping into
/// an [`Offer`] goes through [`lenient_amount`].
pub type LedgerValue = serde_json::Value;

/// Offer record exactly as the ledger stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    /// Offer identifier.
    pub id: OfferId,
    /// Role label.
    pub role: String,
    /// Handle of the encrypted employer offer.
    pub encrypted_offer: CiphertextHandle,
    /// Plain employer value the ledger compares against. Never surfaced.
    pub employer_comparator: LedgerValue,
    /// Public candidate expectation.
    pub candidate_expectation: LedgerValue,
    /// Cleartext written by a successful verification.
    pub decrypted_value: LedgerValue,
    /// Creation time, seconds since UNIX epoch.
    pub created_at: LedgerValue,
    /// Submitting identity.
    pub creator: String,
    /// Ledger-computed match flag.
    pub is_match: bool,
    /// Ledger-tracked verification flag.
    pub is_verified: bool,
    /// Free-text note attached at creation.
    pub note: String,
}

/// A salary offer as seen by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer identifier.
    pub id: OfferId,
    /// Role label.
    pub role: String,
    /// Handle of the encrypted employer offer.
    pub employer_offer_encrypted: CiphertextHandle,
    /// Employer offer cleartext, only once verified.
    pub employer_offer_cleartext: Option<u64>,
    /// Public candidate expectation.
    pub candidate_expectation: u64,
    /// Creation time, seconds since UNIX epoch.
    pub created_at: u64,
    /// Submitting identity.
    pub creator: String,
    /// Ledger-supplied match flag.
    pub is_match: bool,
    /// Verification flag.
    pub is_verified: bool,
}

impl Offer {
    /// Map a ledger record into the snapshot shape.
    ///
    /// Numeric fields that do not parse become zero. The cleartext is only
    /// carried over when the ledger reports the record as verified.
    pub fn from_record(record: OfferRecord) -> Self {
        let employer_offer_cleartext = if record.is_verified {
            Some(lenient_amount(&record.decrypted_value))
        } else {
            None
        };

        Self {
            id: record.id,
            role: record.role,
            employer_offer_encrypted: record.encrypted_offer,
            employer_offer_cleartext,
            candidate_expectation: lenient_amount(&record.candidate_expectation),
            created_at: lenient_amount(&record.created_at),
            creator: record.creator,
            is_match: record.is_match,
            is_verified: record.is_verified,
        }
    }
}

/// Convert a raw ledger value to an amount, defaulting to zero.
pub fn lenient_amount(value: &LedgerValue) -> u64 {
    match value {
        LedgerValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_to_amount))
            .unwrap_or(0),
        LedgerValue::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_amount))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_amount(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f <= u64::MAX as f64 {
        Some(f.trunc() as u64)
    } else {
        None
    }
}

/// Parse a form field the way a browser `parseInt(..) || 0` would:
/// leading integer digits are accepted, anything else yields zero.
/// Values past `u64::MAX` saturate.
pub fn parse_form_amount(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, d| {
            acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
        })
}

/// Everything the ledger needs to create an offer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOfferSubmission {
    /// Identifier chosen by the client.
    pub id: OfferId,
    /// Role label.
    pub role: String,
    /// Encrypted employer value and its input proof.
    pub encrypted: EncryptedInput,
    /// Plain employer value for the ledger-side comparator.
    pub employer_comparator: u64,
    /// Public candidate expectation.
    pub candidate_expectation: u64,
    /// Free-text note.
    pub note: String,
    /// Submitting identity.
    pub creator: Identity,
}

/// Create-form input state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDraft {
    /// Role label as typed.
    pub role: String,
    /// Employer offer as typed.
    pub employer_offer: String,
    /// Candidate expectation as typed.
    pub candidate_expectation: String,
}

impl OfferDraft {
    /// All three fields are required before the form can be submitted.
    pub fn is_submittable(&self) -> bool {
        !self.role.trim().is_empty()
            && !self.employer_offer.trim().is_empty()
            && !self.candidate_expectation.trim().is_empty()
    }

    /// Employer offer parsed leniently.
    pub fn employer_value(&self) -> u64 {
        parse_form_amount(&self.employer_offer)
    }

    /// Candidate expectation parsed leniently.
    pub fn candidate_value(&self) -> u64 {
        parse_form_amount(&self.candidate_expectation)
    }
}

/// The single, session-wide status of the most recent mutating operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    /// Current state.
    pub state: TransactionState,
    /// Human-readable description.
    pub message: String,
    /// Whether the status is currently displayed.
    pub visible: bool,
}

impl TransactionStatus {
    /// A visible status.
    pub fn shown(state: TransactionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            visible: true,
        }
    }

    /// The cleared, idle status.
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Nothing is being displayed.
    pub fn is_idle(&self) -> bool {
        !self.visible
    }
}

/// Aggregate counts over a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferStats {
    /// Number of offers.
    pub total: usize,
    /// Offers flagged as matching.
    pub matches: usize,
    /// Offers verified on-chain.
    pub verified: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(verified: bool) -> OfferRecord {
        OfferRecord {
            id: OfferId::new("offer-1"),
            role: "Engineer".into(),
            encrypted_offer: CiphertextHandle([1u8; 32]),
            employer_comparator: json!(120000),
            candidate_expectation: json!("100000"),
            decrypted_value: json!(120000),
            created_at: json!(1_700_000_000u64),
            creator: "0xAbC".into(),
            is_match: false,
            is_verified: verified,
            note: "Salary negotiation offer".into(),
        }
    }

    #[test]
    fn test_cleartext_hidden_until_verified() {
        let offer = Offer::from_record(record(false));
        assert_eq!(offer.employer_offer_cleartext, None);
        assert_eq!(offer.candidate_expectation, 100000);
    }

    #[test]
    fn test_cleartext_present_when_verified() {
        let offer = Offer::from_record(record(true));
        assert_eq!(offer.employer_offer_cleartext, Some(120000));
    }

    #[test]
    fn test_malformed_numbers_default_to_zero() {
        let mut r = record(true);
        r.candidate_expectation = json!("not-a-number");
        r.created_at = json!(null);
        r.decrypted_value = json!({"nested": 1});
        let offer = Offer::from_record(r);
        assert_eq!(offer.candidate_expectation, 0);
        assert_eq!(offer.created_at, 0);
        assert_eq!(offer.employer_offer_cleartext, Some(0));
    }

    #[test]
    fn test_lenient_amount_variants() {
        assert_eq!(lenient_amount(&json!(42)), 42);
        assert_eq!(lenient_amount(&json!(42.9)), 42);
        assert_eq!(lenient_amount(&json!(" 77 ")), 77);
        assert_eq!(lenient_amount(&json!("1e3")), 1000);
        assert_eq!(lenient_amount(&json!(-5)), 0);
        assert_eq!(lenient_amount(&json!(true)), 0);
    }

    #[test]
    fn test_parse_form_amount() {
        assert_eq!(parse_form_amount("95000"), 95000);
        assert_eq!(parse_form_amount("  95000usd"), 95000);
        assert_eq!(parse_form_amount("+12"), 12);
        assert_eq!(parse_form_amount("-12"), 0);
        assert_eq!(parse_form_amount("abc"), 0);
        assert_eq!(parse_form_amount(""), 0);
        assert_eq!(parse_form_amount("18446744073709551615"), u64::MAX);
        assert_eq!(parse_form_amount("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_draft_submittable() {
        let mut draft = OfferDraft::default();
        assert!(!draft.is_submittable());
        draft.role = "Designer".into();
        draft.employer_offer = "80000".into();
        assert!(!draft.is_submittable());
        draft.candidate_expectation = "85000".into();
        assert!(draft.is_submittable());
        assert_eq!(draft.candidate_value(), 85000);
    }

    #[test]
    fn test_status_hidden_is_idle() {
        assert!(TransactionStatus::hidden().is_idle());
        assert!(!TransactionStatus::shown(TransactionState::Pending, "x").is_idle());
    }
}
