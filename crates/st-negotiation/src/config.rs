//! # Negotiation Configuration
//!
//! Configuration for the negotiation engine.

use crate::domain::{ERROR_CLEAR_MS, SUCCESS_CLEAR_MS};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Default note attached to every new offer.
pub const DEFAULT_OFFER_NOTE: &str = "Salary negotiation offer";

/// Negotiation engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// How long a success status stays visible, in milliseconds.
    pub success_clear_ms: u64,

    /// How long an error status stays visible, in milliseconds.
    pub error_clear_ms: u64,

    /// Note attached to every new offer.
    pub offer_note: String,

    /// Retries with a regenerated id after a duplicate-id rejection.
    pub duplicate_id_retries: u32,

    /// Prefix for generated offer ids.
    pub id_prefix: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            success_clear_ms: SUCCESS_CLEAR_MS,
            error_clear_ms: ERROR_CLEAR_MS,
            offer_note: DEFAULT_OFFER_NOTE.to_string(),
            duplicate_id_retries: 1,
            id_prefix: "offer".to_string(),
        }
    }
}

impl NegotiationConfig {
    /// Create a config for testing (short status delays).
    pub fn for_testing() -> Self {
        Self {
            success_clear_ms: 20,
            error_clear_ms: 30,
            ..Self::default()
        }
    }

    /// Defaults overlaid with environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ST_SUCCESS_CLEAR_MS`: success status lifetime (default: 2000)
    /// - `ST_ERROR_CLEAR_MS`: error status lifetime (default: 3000)
    /// - `ST_OFFER_NOTE`: note attached to new offers
    /// - `ST_DUPLICATE_ID_RETRIES`: retries after a duplicate id (default: 1)
    /// - `ST_ID_PREFIX`: offer id prefix (default: offer)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var("ST_SUCCESS_CLEAR_MS") {
            config.success_clear_ms = ms;
        }
        if let Some(ms) = parse_var("ST_ERROR_CLEAR_MS") {
            config.error_clear_ms = ms;
        }
        if let Some(retries) = parse_var("ST_DUPLICATE_ID_RETRIES") {
            config.duplicate_id_retries = retries;
        }
        if let Ok(note) = env::var("ST_OFFER_NOTE") {
            config.offer_note = note;
        }
        if let Ok(prefix) = env::var("ST_ID_PREFIX") {
            if !prefix.is_empty() {
                config.id_prefix = prefix;
            }
        }

        config
    }

    /// Success status lifetime.
    pub fn success_clear_after(&self) -> Duration {
        Duration::from_millis(self.success_clear_ms)
    }

    /// Error status lifetime.
    pub fn error_clear_after(&self) -> Duration {
        Duration::from_millis(self.error_clear_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[st-negotiation] Ignoring malformed {}={}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NegotiationConfig::default();
        assert_eq!(config.success_clear_after(), Duration::from_secs(2));
        assert_eq!(config.error_clear_after(), Duration::from_secs(3));
        assert_eq!(config.offer_note, DEFAULT_OFFER_NOTE);
        assert_eq!(config.duplicate_id_retries, 1);
    }

    #[test]
    fn test_testing_config() {
        let config = NegotiationConfig::for_testing();
        assert!(config.success_clear_ms < config.error_clear_ms);
        assert_eq!(config.id_prefix, "offer");
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = NegotiationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: NegotiationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
